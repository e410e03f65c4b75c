use crate::Error;
use std::collections::VecDeque;
use std::io::{BufRead, Write, stdin, stdout};

/// Input and output for the machine. `get` supplies the value for a `GET`, and `put` receives
/// the value of every `PUT`.
pub trait Device {
    fn get(&mut self) -> Result<i64, Error>;
    fn put(&mut self, value: i64) -> Result<(), Error>;
}

/// A device with canned input that records everything the program writes.
///
/// Tests run a compiled program against one of these and compare `output` with the expected
/// values.
#[derive(Debug, Default)]
pub struct TestingDevice {
    pub input: VecDeque<i64>,
    pub output: Vec<i64>,
}

impl TestingDevice {
    pub fn new(input: impl IntoIterator<Item = i64>) -> Self {
        Self {
            input: input.into_iter().collect(),
            output: vec![],
        }
    }
}

impl Device for TestingDevice {
    fn get(&mut self) -> Result<i64, Error> {
        self.input.pop_front().ok_or(Error::InputExhausted)
    }

    fn put(&mut self, value: i64) -> Result<(), Error> {
        self.output.push(value);
        Ok(())
    }
}

/// Reads whitespace separated integers from stdin and prints each output value on its own line.
#[derive(Debug, Default)]
pub struct StandardDevice {
    pending: VecDeque<String>,
}

impl Device for StandardDevice {
    fn get(&mut self) -> Result<i64, Error> {
        while self.pending.is_empty() {
            print!("? ");
            stdout()
                .flush()
                .map_err(|e| Error::Device(e.to_string()))?;

            let mut line = String::new();
            let read = stdin()
                .lock()
                .read_line(&mut line)
                .map_err(|e| Error::Device(e.to_string()))?;
            if read == 0 {
                return Err(Error::InputExhausted);
            }

            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }

        let token = self.pending.pop_front().unwrap_or_default();
        token
            .parse::<i64>()
            .map_err(|e| Error::Device(format!("`{token}` is not an integer: {e}")))
    }

    fn put(&mut self, value: i64) -> Result<(), Error> {
        println!("> {value}");
        Ok(())
    }
}
