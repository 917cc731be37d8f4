use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::Path,
};

use embedded_storage::{ReadStorage, Storage};

/// Fixed-size byte region backed by a regular file. Fresh space reads as erased (`0xFF`).
#[derive(Debug)]
pub(super) struct FileStorage {
    file: File,
    capacity: usize,
}

impl FileStorage {
    pub(super) fn open(path: &Path, capacity: usize) -> io::Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len() as usize;
        if len < capacity {
            file.seek(SeekFrom::Start(len as u64))?;
            file.write_all(&vec![0xFF; capacity - len])?;
            file.flush()?;
        }

        Ok(Self { file, capacity })
    }

    fn check_bounds(&self, offset: u32, len: usize) -> io::Result<()> {
        if (offset as usize).saturating_add(len) > self.capacity {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "access beyond storage capacity",
            ));
        }
        Ok(())
    }
}

impl ReadStorage for FileStorage {
    type Error = io::Error;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        self.check_bounds(offset, bytes.len())?;
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.read_exact(bytes)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Storage for FileStorage {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        self.check_bounds(offset, bytes.len())?;
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(bytes)?;
        self.file.sync_data()
    }
}
