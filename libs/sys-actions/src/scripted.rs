//! [`CommandRunner`] that never touches the host, handy for tests and dry runs
use std::{collections::VecDeque, io};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::runner::{CommandOutput, CommandRunner, command_line};

/// Answers commands from a script and records every command line it was
/// asked to run. Commands without a matching rule succeed with no output, so
/// `ScriptedRunner::new()` alone is a dry-run runner: nothing is executed and
/// [`ScriptedRunner::calls`] shows what would have been.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
}

#[derive(Debug)]
struct Rule {
    prefix: String,
    outputs: VecDeque<CommandOutput>,
    spawn_error: bool,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// commands starting with `prefix` return `output`
    pub fn respond(self, prefix: &str, output: CommandOutput) -> Self {
        self.respond_seq(prefix, [output])
    }

    /// commands starting with `prefix` return `outputs` in order, the last one
    /// repeats once the others are used up
    pub fn respond_seq<I>(self, prefix: &str, outputs: I) -> Self
    where
        I: IntoIterator<Item = CommandOutput>,
    {
        self.rules.lock().push(Rule {
            prefix: prefix.to_owned(),
            outputs: outputs.into_iter().collect(),
            spawn_error: false,
        });
        self
    }

    /// commands starting with `prefix` fail to start, as if not installed
    pub fn missing(self, prefix: &str) -> Self {
        self.rules.lock().push(Rule {
            prefix: prefix.to_owned(),
            outputs: VecDeque::new(),
            spawn_error: true,
        });
        self
    }

    /// every command line seen so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// # of recorded command lines starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    fn answer(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let line = command_line(program, args);
        self.calls.lock().push(line.clone());

        let mut rules = self.rules.lock();
        let Some(rule) = rules.iter_mut().find(|rule| line.starts_with(&rule.prefix)) else {
            return Ok(CommandOutput::success(""));
        };
        if rule.spawn_error {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{program}: command not found"),
            ));
        }
        let output = if rule.outputs.len() > 1 {
            rule.outputs.pop_front()
        } else {
            rule.outputs.front().cloned()
        };
        Ok(output.unwrap_or_else(|| CommandOutput::success("")))
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        self.answer(program, args)
    }

    async fn spawn(&self, program: &str, args: &[&str]) -> io::Result<()> {
        self.answer(program, args).map(|_| ())
    }
}
