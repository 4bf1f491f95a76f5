//! Interactive REPL.
//!
//! Reads a line, classifies it as a command, an exit word or an utterance,
//! and answers utterances through the [`Session`] and, when configured, the
//! [`Delegate`].

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::colors;
use crate::delegate::Delegate;
use crate::display;
use crate::session::Session;

/// Words that end the conversation, compared case-insensitively.
pub const EXIT_WORDS: [&str; 5] = ["exit", "quit", "bye", "goodbye", "q"];

/// Slash commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `/help`
    Help,
    /// `/sass`
    Sass,
    /// `/history`
    History,
    /// `/stats`
    Stats,
    /// `/why <text>`
    Why(&'a str),
    /// Anything else starting with `/`.
    Unknown(&'a str),
}

/// What a line of input asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    /// Blank line.
    Empty,
    /// An exit word.
    Exit,
    /// A slash command.
    Command(Command<'a>),
    /// Something to answer.
    Utterance(&'a str),
}

/// Classify one line of input.
#[must_use]
pub fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if EXIT_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w)) {
        return Input::Exit;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Input::Utterance(line);
    };
    let (name, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let command = match name.to_ascii_lowercase().as_str() {
        "help" => Command::Help,
        "sass" => Command::Sass,
        "history" => Command::History,
        "stats" => Command::Stats,
        "why" => Command::Why(arg.trim()),
        _ => Command::Unknown(line),
    };
    Input::Command(command)
}

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    session: Session,
    delegate: Option<Delegate>,
    persona_name: String,
    history_display: usize,
}

impl Repl {
    /// Create a REPL around a session.
    ///
    /// # Errors
    /// Fails if the terminal cannot be set up for line editing.
    pub fn new(
        session: Session,
        delegate: Option<Delegate>,
        persona_name: impl Into<String>,
        history_display: usize,
    ) -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            session,
            delegate,
            persona_name: persona_name.into(),
            history_display,
        })
    }

    /// Run the REPL loop until an exit word, Ctrl+C or Ctrl+D.
    ///
    /// # Errors
    /// Fails only if reading from the terminal fails.
    pub async fn run(&mut self) -> Result<()> {
        if let Some(greeting) = self.session.greeting() {
            println!("{}\n", display::bookend(&self.persona_name, greeting));
        }
        println!("{}\n", colors::dim("Type /help for commands, exit to leave."));

        loop {
            match self.editor.readline(&colors::prompt()) {
                Ok(line) => {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        debug!(error = %e, "history entry not saved");
                    }
                    match classify(&line) {
                        Input::Empty => {}
                        Input::Exit => break,
                        Input::Command(command) => self.command(command),
                        Input::Utterance(utterance) => self.turn(utterance).await,
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        self.farewell();
        Ok(())
    }

    async fn turn(&mut self, utterance: &str) {
        let mut reply = self.session.select(utterance);
        if let Some(delegate) = &self.delegate {
            reply = delegate
                .enhance(utterance, reply, self.session.engine().index())
                .await;
        }
        self.session.record(utterance, &reply);
        debug!(
            session = %self.session.id(),
            source = ?reply.source,
            intensity = reply.intensity.value(),
            "turn answered"
        );
        println!("\n{}\n", display::reply(&self.persona_name, &reply));
    }

    fn command(&self, command: Command<'_>) {
        let out = match command {
            Command::Help => display::help(),
            Command::Sass => display::sass_legend(),
            Command::History => display::history(
                &self.persona_name,
                self.session.recent(self.history_display),
            ),
            Command::Stats => display::session_stats(&self.persona_name, &self.session.stats()),
            Command::Why("") => colors::warning("usage: /why <text>"),
            Command::Why(text) => {
                let (trace, ranked) = self.session.why(text);
                display::why(&trace, &ranked)
            }
            Command::Unknown(line) => format!(
                "{}\n{}",
                colors::warning(&format!("Unknown command: {line}")),
                colors::dim("Type /help for available commands")
            ),
        };
        println!("{out}\n");
    }

    fn farewell(&self) {
        if let Some(goodbye) = self.session.goodbye() {
            println!("\n{}", display::bookend(&self.persona_name, goodbye));
        }
        let stats = self.session.stats();
        if stats.turns > 0 {
            println!("\n{}", display::session_stats(&self.persona_name, &stats));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words_are_case_insensitive() {
        for word in ["exit", "QUIT", " Bye ", "goodbye", "q"] {
            assert_eq!(classify(word), Input::Exit, "{word}");
        }
        assert_eq!(classify("quite"), Input::Utterance("quite"));
    }

    #[test]
    fn commands_parse_with_arguments() {
        assert_eq!(classify("/help"), Input::Command(Command::Help));
        assert_eq!(classify("/SASS"), Input::Command(Command::Sass));
        assert_eq!(classify("/why  my bike "), Input::Command(Command::Why("my bike")));
        assert_eq!(classify("/why"), Input::Command(Command::Why("")));
        assert_eq!(classify("/dance now"), Input::Command(Command::Unknown("/dance now")));
    }

    #[test]
    fn blank_and_plain_lines() {
        assert_eq!(classify("   "), Input::Empty);
        assert_eq!(classify("  tell me about your bike "), Input::Utterance("tell me about your bike"));
    }
}
