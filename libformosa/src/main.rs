use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use libformosa::keyhandler::{KeyEvent, KeyHandler, KeyName};
use libformosa::{maybe_absolute_order_key, BopomofoConfig, KeyboardLayout};
use libformosa_core::{
    CandidateController, InputState, LanguageModel, Lexicon, Model, UserPhrases,
};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "libformosa", about = "Bopomofo input method engine")]
struct Cli {
    /// Keyboard layout (Standard, ETen, Hsu, ETen26, HanyuPinyin, IBM)
    #[arg(long, default_value = "Standard")]
    layout: String,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive REPL: type keystrokes, see states and candidates
    Interactive,
    /// Look up dictionary entries for a reading key
    Lookup { reading: String },
    /// Export learned user phrases as JSON
    ExportPhrases,
}

fn build_demo_model() -> Model {
    // Prefer compiled artifacts, fall back to the plain-text dictionary,
    // then to a tiny inline demo set.
    let data_dir = Path::new("data");
    let fst_path = data_dir.join("lexicon.fst");
    let bin_path = data_dir.join("lexicon.bin");
    let text_path = data_dir.join("dictionary.txt");

    let (lexicon, compiled) = if fst_path.exists() && bin_path.exists() {
        match Lexicon::load_from_fst_bincode(&fst_path, &bin_path) {
            Ok(lex) => {
                eprintln!(
                    "loaded compiled lexicon: {} + {}",
                    fst_path.display(),
                    bin_path.display()
                );
                (lex, true)
            }
            Err(e) => {
                eprintln!("warning: failed to load compiled lexicon: {}", e);
                (demo_lexicon(), false)
            }
        }
    } else if text_path.exists() {
        match Lexicon::load_from_text(&text_path) {
            Ok(lex) => {
                eprintln!("loaded dictionary: {}", text_path.display());
                (lex, false)
            }
            Err(e) => {
                eprintln!("warning: failed to load dictionary: {}", e);
                (demo_lexicon(), false)
            }
        }
    } else {
        (demo_lexicon(), false)
    };

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let user_path = std::path::PathBuf::from(home)
        .join(".libformosa")
        .join("userphrases.redb");
    let user_phrases = UserPhrases::open(&user_path).unwrap_or_else(|e| {
        eprintln!(
            "warning: failed to open user phrases at {:?}: {}",
            user_path, e
        );
        UserPhrases::new()
    });

    let mut model = Model::new(lexicon, user_phrases);
    if compiled {
        // Compiled artifacts key on the absolute-order encoding.
        model.set_key_transform(Some(Arc::new(|key: &str| maybe_absolute_order_key(key))));
    }
    model
}

fn demo_lexicon() -> Lexicon {
    let mut lex = Lexicon::new();
    for (key, value, score) in [
        ("ㄋㄧˇ", "你", -3.1),
        ("ㄋㄧˇ", "妳", -4.3),
        ("ㄏㄠˇ", "好", -2.6),
        ("ㄋㄧˇ-ㄏㄠˇ", "你好", -4.4),
        ("ㄨㄛˇ", "我", -2.8),
        ("ㄇㄣ˙", "們", -3.0),
        ("ㄨㄛˇ-ㄇㄣ˙", "我們", -4.2),
        ("ㄕˋ", "是", -2.4),
        ("ㄊㄞˊ", "台", -3.3),
        ("ㄨㄢ", "灣", -3.6),
        ("ㄊㄞˊ-ㄨㄢ", "台灣", -4.0),
        ("_punctuation_,", "，", -1.0),
        ("_punctuation_.", "。", -1.0),
        ("_punctuation_?", "？", -1.0),
        ("_punctuation_!", "！", -1.0),
        ("_punctuation_list", "，", -1.0),
        ("_punctuation_list", "。", -1.1),
        ("_punctuation_list", "、", -1.2),
        ("_punctuation_list", "？", -1.3),
        ("_punctuation_list", "！", -1.4),
    ] {
        lex.insert(key, value, score);
    }
    lex
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let layout = KeyboardLayout::from_name(&cli.layout)
        .with_context(|| format!("unknown layout {:?}", cli.layout))?;

    let mut config = match &cli.config {
        Some(path) => BopomofoConfig {
            base: libformosa_core::Config::load_toml(path)
                .map_err(|e| anyhow::anyhow!("config {}: {}", path, e))?,
            keyboard_layout: layout,
        },
        None => BopomofoConfig::default(),
    };
    config.keyboard_layout = layout;

    let model = build_demo_model();

    match cli.command {
        Command::Lookup { reading } => {
            for unigram in model.unigrams_for(&reading) {
                println!("{}\t{}", unigram.value, unigram.score);
            }
            Ok(())
        }
        Command::ExportPhrases => {
            let json = model.user_phrases().export_json()?;
            println!("{}", json);
            Ok(())
        }
        Command::Interactive => interactive(model, config),
    }
}

fn interactive(model: Model, config: BopomofoConfig) -> Result<()> {
    let candidate_keys = config.base.candidate_keys.clone();
    let mut handler = KeyHandler::new(model, config);
    let mut state = InputState::Empty;
    let mut controller = CandidateController::with_key_caps(&candidate_keys);

    println!("libformosa interactive (:q quits, :help lists commands)");
    let stdin = io::stdin();
    print_prompt(&state);

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim_end();

        if let Some(command) = trimmed.strip_prefix(':') {
            match command {
                "q" | "quit" => break,
                "help" => {
                    println!(
                        ":q :reset :enter :space :bs :del :esc :tab :left :right :home :end :sl :sr"
                    );
                }
                "reset" => {
                    handler.reset();
                    state = InputState::Empty;
                }
                other => {
                    if let Some(key) = command_key(other) {
                        feed(&mut handler, &mut state, key, &mut controller);
                    } else {
                        println!("unknown command :{}", other);
                    }
                }
            }
            print_prompt(&state);
            continue;
        }

        // Inside the candidate window, a single configured hotkey selects.
        if let InputState::ChoosingCandidate(_) = &state {
            let chars: Vec<char> = trimmed.chars().collect();
            if chars.len() == 1 {
                if let Some(candidate) = controller.selected_candidate_with_key(chars[0]).cloned() {
                    let mut emitted = Vec::new();
                    handler.candidate_selected(&candidate, &mut |s| emitted.push(s));
                    adopt(&mut state, emitted, &mut controller);
                    print_prompt(&state);
                    continue;
                }
            }
        }

        for ch in trimmed.chars() {
            let key = if ch == ' ' {
                KeyEvent::named(KeyName::Space)
            } else {
                KeyEvent::ascii(ch)
            };
            feed(&mut handler, &mut state, key, &mut controller);
        }
        print_prompt(&state);
    }
    Ok(())
}

fn command_key(name: &str) -> Option<KeyEvent> {
    Some(match name {
        "enter" => KeyEvent::named(KeyName::Return),
        "space" => KeyEvent::named(KeyName::Space),
        "bs" => KeyEvent::named(KeyName::Backspace),
        "del" => KeyEvent::named(KeyName::Delete),
        "esc" => KeyEvent::named(KeyName::Esc),
        "tab" => KeyEvent::named(KeyName::Tab),
        "left" => KeyEvent::named(KeyName::Left),
        "right" => KeyEvent::named(KeyName::Right),
        "home" => KeyEvent::named(KeyName::Home),
        "end" => KeyEvent::named(KeyName::End),
        "sl" => KeyEvent::named(KeyName::Left).shifted(),
        "sr" => KeyEvent::named(KeyName::Right).shifted(),
        _ => return None,
    })
}

fn feed(
    handler: &mut KeyHandler,
    state: &mut InputState,
    key: KeyEvent,
    controller: &mut CandidateController,
) {
    let prev = state.clone();
    let mut emitted = Vec::new();
    let mut beeped = false;
    let handled = handler.handle(&key, &prev, &mut |s| emitted.push(s), &mut || beeped = true);
    if beeped {
        println!("(beep)");
    }
    if !handled {
        println!("(passed through)");
        return;
    }
    adopt(state, emitted, controller);
}

fn adopt(
    state: &mut InputState,
    emitted: Vec<InputState>,
    controller: &mut CandidateController,
) {
    for next in emitted {
        if let InputState::Committing(c) = &next {
            println!("commit: {}", c.text);
        }
        if let InputState::ChoosingCandidate(choosing) = &next {
            controller.set_candidates(choosing.candidates.clone());
        }
        *state = next;
    }
}

fn print_prompt(state: &InputState) {
    match state {
        InputState::Empty | InputState::EmptyIgnoringPrevious | InputState::Committing(_) => {
            print!("> ");
        }
        InputState::Inputting(inputting) => {
            if !inputting.evicted_text.is_empty() {
                println!("evicted: {}", inputting.evicted_text);
            }
            if !inputting.composing.tooltip.is_empty() {
                println!("({})", inputting.composing.tooltip);
            }
            println!(
                "[{}] cursor={}",
                inputting.composing.buffer, inputting.composing.cursor_index
            );
            print!("> ");
        }
        InputState::ChoosingCandidate(choosing) => {
            println!("[{}]", choosing.composing.buffer);
            for (i, candidate) in choosing.candidates.iter().take(9).enumerate() {
                println!("  {}. {}", i + 1, candidate.value);
            }
            print!("select> ");
        }
        InputState::Marking(marking) => {
            println!(
                "[{}|{}|{}] reading: {}  {}",
                marking.head,
                marking.marked,
                marking.tail,
                marking.reading_ui,
                if marking.acceptable { "(Enter adds)" } else { "(not acceptable)" }
            );
            print!("mark> ");
        }
    }
    let _ = io::stdout().flush();
}
