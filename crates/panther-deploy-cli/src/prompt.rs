// Interactive prompts on the terminal

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use panther_deploy_orchestration::{DeployError, Prompter, Result, Validator};

use crate::output::OutputStyle;

/// Reads answers line by line, asking again until the validator accepts.
///
/// Reads block, so each prompt runs on tokio's blocking pool.
pub struct LinePrompter<R, W> {
    terminal: Arc<Terminal<R, W>>,
}

struct Terminal<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
    style: OutputStyle,
}

/// Prompter bound to the process's stdin and stdout
pub type StdinPrompter = LinePrompter<io::BufReader<io::Stdin>, io::Stdout>;

impl StdinPrompter {
    pub fn stdio() -> Self {
        LinePrompter::new(io::BufReader::new(io::stdin()), io::stdout(), OutputStyle::default())
    }
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W, style: OutputStyle) -> Self {
        Self {
            terminal: Arc::new(Terminal {
                input: Mutex::new(input),
                output: Mutex::new(output),
                style,
            }),
        }
    }
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    fn write(&self, text: &str, newline: bool) -> io::Result<()> {
        let mut output = self
            .output
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "prompt output poisoned"))?;
        if newline {
            writeln!(output, "{}", text)?;
        } else {
            write!(output, "{}", text)?;
        }
        output.flush()
    }

    fn read_line(&self) -> io::Result<Option<String>> {
        let mut input = self
            .input
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "prompt input poisoned"))?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn ask(&self, question: &str, validator: Validator) -> Result<String> {
        loop {
            self.write(&self.style.prompt(question), false)?;
            let answer = self.read_line()?.ok_or_else(|| {
                DeployError::Prompt(format!("input closed while asking '{}'", question.trim()))
            })?;

            match validator(&answer) {
                Ok(()) => return Ok(answer),
                Err(reason) => self.write(&self.style.error(&reason), true)?,
            }
        }
    }
}

#[async_trait]
impl<R, W> Prompter for LinePrompter<R, W>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    async fn prompt(&self, question: &str, validator: Validator) -> Result<String> {
        let terminal = Arc::clone(&self.terminal);
        let question = question.to_string();
        tokio::task::spawn_blocking(move || terminal.ask(&question, validator))
            .await
            .map_err(|e| DeployError::Prompt(format!("prompt task failed: {}", e)))?
    }

    fn say(&self, message: &str) {
        // Nothing useful to do if the terminal is gone
        let _ = self
            .terminal
            .write(&self.terminal.style.header(message), true);
    }
}
