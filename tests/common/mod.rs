#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use trellis::Response;

/// Write sink that keeps emitted bytes inspectable after the response has
/// consumed its writer.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A response writing into an inspectable buffer.
pub fn capture() -> (Response, SharedBuf) {
    let buf = SharedBuf::default();
    (Response::new(Box::new(buf.clone())), buf)
}
