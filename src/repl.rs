use std::env;
use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, atomic::AtomicBool};

use nu_ansi_term::Style;
use reedline::{DefaultPrompt, DefaultPromptSegment, Highlighter, HistoryItem, Signal, StyledText};
use tracing::debug;

use crate::config::settings;
use crate::scan::{COMMENT, TERMINATOR};
use crate::{StepControl, TapeMachine, cli_util, compile};

/// Exit after one execution when set to `1`.
pub const REPL_ONCE_ENV: &str = "SCREW_REPL_ONCE";

/// Forces `bare` or `editor` mode.
pub const REPL_MODE_ENV: &str = "SCREW_REPL_MODE";

pub fn repl_loop() -> io::Result<()> {
    // Initialize interactive line editor
    let mut editor = init_line_editor()?;

    loop {
        // Prompt and read a multi-line submission via editor
        let Some(submission) = read_submission_interactive(&mut editor)? else {
            // EOF or editor closed. End the session cleanly to avoid hanging when stdin is closed
            println!();
            io::stdout().flush()?;
            return Ok(());
        };

        if submission.trim().is_empty() {
            continue; // Ignore empty submissions
        }

        execute_buffer(&submission);

        // Test hook: if SCREW_REPL_ONCE=1, exit after one execution
        if env::var(REPL_ONCE_ENV).ok().as_deref() == Some("1") {
            return Ok(());
        }
    }
}

fn init_line_editor() -> io::Result<reedline::Reedline> {
    use reedline::{
        EditCommand, Emacs, KeyCode, KeyModifiers, Reedline, ReedlineEvent, default_emacs_keybindings,
    };

    // Start from default emacs-like bindings and adjust:
    // - Enter -> InsertNewLine (do not submit)
    // - Ctrl+D -> Submit
    // - Ctrl+Z -> Submit (for Windows)
    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Edit(vec![EditCommand::InsertNewline]));
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('z'), ReedlineEvent::Submit);

    // Up/down move within the current multiline buffer; Alt/Ctrl+Up/Down browse history.
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Down, ReedlineEvent::NextHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Down, ReedlineEvent::NextHistory);

    let history = reedline::FileBackedHistory::new(1_000)
        .map_err(|e| io::Error::other(e.to_string()))?;

    let editor = Reedline::create()
        .with_highlighter(Box::new(ScrewHighlighter::new_catppuccin_mocha()))
        .with_history(Box::new(history))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    Ok(editor)
}

pub fn read_submission<R: io::BufRead>(stdin: &mut R) -> Option<String> {
    // Collect all lines until EOF
    let mut buffer = String::new();

    loop {
        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => buffer.push_str(&line),
            Err(_) => return None,
        }
    }

    if buffer.is_empty() { None } else { Some(buffer) }
}

fn read_submission_interactive(editor: &mut reedline::Reedline) -> io::Result<Option<String>> {
    let prompt = DefaultPrompt::new(DefaultPromptSegment::Basic("screw".to_string()), DefaultPromptSegment::Empty);

    // Render prompt and read until user submits with Ctrl+D or Ctrl+Z
    match editor.read_line(&prompt) {
        Ok(Signal::Success(buffer)) => {
            // One history item per submitted buffer (program-level)
            if !buffer.trim().is_empty() {
                let _ = editor.history_mut().save(HistoryItem::from_command_line(buffer.clone()));
            }
            Ok(Some(buffer))
        }
        Ok(Signal::CtrlC) => Ok(None),
        Ok(Signal::CtrlD) => Ok(None),
        Err(e) => {
            eprintln!("repl: editor error: {e}");
            let _ = io::stderr().flush();
            Ok(None)
        }
    }
}

/// Append a terminator to a submission that has none, so a REPL user need not type `~`.
pub fn ensure_terminated(submission: &str) -> String {
    if submission.as_bytes().contains(&TERMINATOR) {
        submission.to_string()
    } else {
        format!("{}\n~", submission.trim_end())
    }
}

/// Executes a single Screw program contained in `buffer`.
/// - Program output goes to stdout.
/// - Errors are printed concisely to stderr.
/// - A newline is always written to stdout after execution (success or error)
///   so that the prompt begins at column 0 on the next iteration.
fn execute_buffer(buffer: &str) {
    let source = ensure_terminated(buffer);
    let cfg = settings();

    match compile(&source) {
        Ok(program) => {
            let mut machine = TapeMachine::with_cells(program, cfg.cells).with_eof_policy(cfg.eof);
            let ctrl = StepControl::new(cfg.max_steps, Arc::new(AtomicBool::new(false)));
            if let Err(err) = machine.run_with_control(ctrl) {
                cli_util::print_machine_error(None, machine.program().as_str(), &err);
            }
        }
        Err(err) => cli_util::print_validation_error(None, &source, &err),
    }

    println!();
    let _ = io::stdout().flush();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    Bare,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlagOverride {
    None,
    Bare,
    Editor,
}

pub fn select_mode(flag: ModeFlagOverride) -> Result<ReplMode, String> {
    // Flag override
    match flag {
        ModeFlagOverride::Bare => return Ok(ReplMode::Bare),
        ModeFlagOverride::Editor => {
            if !io::stdin().is_terminal() {
                return Err("cannot start editor: stdin is not a TTY (use --bare or SCREW_REPL_MODE=bare)".to_string());
            }
            return Ok(ReplMode::Editor);
        }
        ModeFlagOverride::None => {}
    }

    // Environment override
    if let Ok(val) = env::var(REPL_MODE_ENV) {
        let v = val.trim().to_ascii_lowercase();
        return match v.as_str() {
            "bare" => Ok(ReplMode::Bare),
            "editor" => {
                if !io::stdin().is_terminal() {
                    return Err("cannot start editor: stdin is not a TTY (use SCREW_REPL_MODE=bare)".to_string());
                }
                Ok(ReplMode::Editor)
            }
            _ => Err(format!("invalid SCREW_REPL_MODE value: {val}, must be 'bare' or 'editor'")),
        };
    }

    // Auto-detect
    if io::stdin().is_terminal() {
        Ok(ReplMode::Editor)
    } else {
        Ok(ReplMode::Bare)
    }
}

/// Bare mode: read stdin until EOF and run it once.
pub fn execute_bare_once() -> io::Result<()> {
    let mut locked = io::BufReader::new(io::stdin().lock());
    match read_submission(&mut locked) {
        Some(s) if !s.trim().is_empty() => execute_buffer(&s),
        _ => debug!("empty submission; nothing to run"),
    }
    Ok(())
}

#[derive(Default)]
struct ScrewHighlighter {
    right: Style,
    left: Style,
    inc: Style,
    dec: Style,
    output: Style,
    input: Style,
    flow: Style,
    dump: Style,
    terminator: Style,
    comment: Style,
    other: Style,
}

impl ScrewHighlighter {
    fn new_catppuccin_mocha() -> Self {
        use crate::theme::catppuccin::Mocha as P;

        // > <       => SKY / TEAL (movement)
        // + -       => GREEN / RED (data modification)
        // . ?       => YELLOW / PEACH (I/O)
        // { }       => MAUVE (flow control)
        // * ^ 0-9   => PINK (cell dump)
        // ; and everything after ~ => OVERLAY0
        Self {
            right: Style::new().fg(P::SKY).bold(),
            left: Style::new().fg(P::TEAL).bold(),
            inc: Style::new().fg(P::GREEN).bold(),
            dec: Style::new().fg(P::RED).bold(),
            output: Style::new().fg(P::YELLOW).bold(),
            input: Style::new().fg(P::PEACH).bold(),
            flow: Style::new().fg(P::MAUVE).bold(),
            dump: Style::new().fg(P::PINK).bold(),
            terminator: Style::new().fg(P::TEXT).bold(),
            comment: Style::new().fg(P::OVERLAY0).italic(),
            other: Style::new().fg(P::SURFACE2),
        }
    }

    #[inline]
    fn style_for(&self, ch: char) -> Style {
        match ch {
            '>' => self.right,
            '<' => self.left,
            '+' => self.inc,
            '-' => self.dec,
            '.' => self.output,
            '?' => self.input,
            '{' | '}' => self.flow,
            '*' | '^' | '0'..='9' => self.dump,
            '~' => self.terminator,
            _ => self.other,
        }
    }
}

impl Highlighter for ScrewHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut out = StyledText::new();
        let mut current_style: Option<Style> = None;
        let mut buffer = String::new();
        let mut in_comment = false;
        let mut terminated = false;

        for ch in line.chars() {
            if ch == COMMENT as char && !terminated {
                in_comment = true;
            }
            let style = if terminated || in_comment {
                self.comment
            } else {
                self.style_for(ch)
            };
            if ch == '\n' {
                in_comment = false;
            }
            if ch == TERMINATOR as char {
                terminated = true;
            }

            match current_style {
                Some(s) if s == style => buffer.push(ch),
                Some(s) => {
                    out.push((s, std::mem::take(&mut buffer)));
                    current_style = Some(style);
                    buffer.push(ch);
                }
                None => {
                    current_style = Some(style);
                    buffer.push(ch);
                }
            }
        }

        if let Some(s) = current_style {
            if !buffer.is_empty() {
                out.push((s, buffer));
            }
        }
        out
    }
}
