use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// Shared, serialised sink for progress and report output.
///
/// Every call writes its whole message under one lock so lines from
/// concurrently running models never interleave.
#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Writes `lines` as one uninterrupted block.
    pub fn lines<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = self.out.lock();
        let result = lines
            .into_iter()
            .try_for_each(|line| writeln!(out, "{}", line.as_ref()))
            .and_then(|_| out.flush());
        if let Err(err) = result {
            log::warn!("console write failed: {err}");
        }
    }

    pub fn line(&self, line: impl AsRef<str>) {
        self.lines([line]);
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

/// In-memory writer for capturing console output.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_blocks_in_order() {
        let buffer = SharedBuffer::default();
        let console = Console::new(buffer.clone());
        console.line("first");
        console.lines(["second", "third"]);
        assert_eq!(buffer.contents(), "first\nsecond\nthird\n");
    }

    #[test]
    fn concurrent_blocks_do_not_interleave() {
        let buffer = SharedBuffer::default();
        let console = Console::new(buffer.clone());
        let handles: Vec<_> = (0..8)
            .map(|id| {
                let console = console.clone();
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        console.lines([format!("{id}:begin"), format!("{id}:end")]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let out = buffer.contents();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 8 * 20 * 2);
        for pair in lines.chunks(2) {
            let id = pair[0].strip_suffix(":begin").unwrap();
            assert_eq!(pair[1], format!("{id}:end"));
        }
    }
}
