mod commands;
mod repl;
use clap::{ArgAction, Args, Parser, Subcommand};
use clap_repl::ClapEditor;
use clap_repl::reedline::{
    DefaultPrompt, FileBackedHistory, Highlighter, Prompt, PromptEditMode, PromptHistorySearch,
    StyledText,
};
use nu_ansi_term::{Color, Style};
use pwner::utils::{parse_u64_expr, warn};
use pwner::{ElfImage, Options, Result};
use repl::Repl;
use std::borrow::Cow;
use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Look up symbol, PLT, and GOT addresses in an ELF file
    Elf(ElfArgs),

    /// Run a program and interact with it
    Process(ProcessArgs),

    /// Connect to a TCP service and interact with it
    Remote(RemoteArgs),
}

#[derive(Args)]
struct ElfArgs {
    /// path to an executable or shared library
    path: PathBuf,

    /// Load base, hex with 0x or decimal
    #[arg(long, value_parser = parse_u64_expr)]
    base: Option<u64>,
}

#[derive(Args)]
struct SessionArgs {
    /// Seconds to wait when connecting and for each network read or write, 0 waits forever
    #[arg(long, value_parser = commands::parse_timeout, default_value = "30")]
    timeout: Duration,

    /// Line delimiter, escapes like \r\n are allowed
    #[arg(long, default_value = r"\n")]
    newline: String,

    /// Log session events, use twice to also dump traffic
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl SessionArgs {
    fn options(&self) -> Options {
        commands::options(self.timeout, &self.newline, self.verbose)
    }
}

#[derive(Args)]
struct ProcessArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Program and arguments, e.g. `pwner process -- ./vuln arg`
    #[arg(required = true, last = true)]
    argv: Vec<String>,
}

#[derive(Args)]
struct RemoteArgs {
    #[command(flatten)]
    session: SessionArgs,

    host: String,

    port: u16,
}

/// Shows what the user types in a single color.
pub struct PwnerHighlighter {
    color: Color,
}

impl Highlighter for PwnerHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled_text = StyledText::new();
        styled_text.push((Style::new().fg(self.color), line.to_string()));
        styled_text
    }
}

impl PwnerHighlighter {
    pub fn new() -> PwnerHighlighter {
        PwnerHighlighter { color: Color::Blue }
    }
}

/// Prompt with the name of the ELF file being examined.
pub struct PwnerPrompt {
    name: String,
    color: clap_repl::reedline::Color,
    default: DefaultPrompt,
}

impl Prompt for PwnerPrompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Borrowed(&self.name)
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> Cow<str> {
        Cow::Borrowed("> ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        self.default.render_prompt_multiline_indicator()
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<str> {
        self.default
            .render_prompt_history_search_indicator(history_search)
    }

    // the text that appears in the prompt
    fn get_prompt_color(&self) -> clap_repl::reedline::Color {
        self.color
    }
}

impl PwnerPrompt {
    fn new(name: String) -> PwnerPrompt {
        PwnerPrompt {
            name,
            color: clap_repl::reedline::Color::DarkBlue,
            default: DefaultPrompt::default(),
        }
    }
}

fn elf_shell(args: &ElfArgs) -> Result<()> {
    let mut image = ElfImage::new(&args.path)?;
    if let Some(base) = args.base {
        image.rebase(base);
    }
    let name = args
        .path
        .file_name()
        .map_or_else(|| "pwner".to_string(), |n| n.to_string_lossy().into_owned());

    // left prompt                    before what the user types
    // highlighter                    this is for what the user types
    let history = std::env::temp_dir().join("pwner-history");
    let rl = ClapEditor::<Repl>::builder()
        .with_prompt(Box::new(PwnerPrompt::new(name)))
        .with_editor_hook(move |reed| {
            let reed = reed.with_highlighter(Box::new(PwnerHighlighter::new()));
            match FileBackedHistory::with_file(10000, history.clone()) {
                Ok(history) => reed.with_history(Box::new(history)),
                Err(err) => {
                    warn(&format!("command history is disabled: {err}"));
                    reed
                }
            }
        })
        .build();

    // One failed lookup shouldn't end the session so errors are reported and the
    // shell carries on.
    let image = RefCell::new(image);
    use repl::MainCommand::*;
    rl.repl(|repl: Repl| {
        let mut image = image.borrow_mut();
        let result = match repl.command {
            Base(args) => {
                commands::base(&mut image, &args, io::stdout());
                Ok(())
            }
            Sym(args) => commands::sym(&image, &args, io::stdout()),
            Plt(args) => commands::plt(&image, &args, io::stdout()),
            Got(args) => commands::got(&image, &args, io::stdout()),
            Symbols(args) => {
                commands::symbols(&image, &args, io::stdout());
                Ok(())
            }
            Hexdump(args) => commands::hexdump(&image, &args, io::stdout()),
            Quit => process::exit(0),
        };
        if let Err(err) = result {
            warn(&err.to_string());
        }
    });
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Elf(args) => elf_shell(args),
        Command::Process(args) => commands::process(&args.argv, args.session.options()),
        Command::Remote(args) => commands::remote(&args.host, args.port, args.session.options()),
    };
    if let Err(err) = result {
        warn(&err.to_string());
        process::exit(1);
    }
}
