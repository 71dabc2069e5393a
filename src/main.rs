//! Terminal front end for the Occult Oracle.
//!
//! Reads questions from stdin and streams the Oracle's answers to stdout.
//! `/topic` summons a random question into the pending input; an empty line
//! sends the pending suggestion; `/quit` departs.

use anyhow::Result;
use occult_oracle::oracle::{
    ChatObserver, Conversation, OracleApp, OracleConfig, RequestState, Role, TopicSuggester,
};
use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Renders the trailing model message incrementally as its text grows.
struct TerminalRenderer {
    // (index of the message being rendered, bytes of it already printed)
    cursor: Mutex<(usize, usize)>,
}

impl TerminalRenderer {
    fn new() -> Self {
        Self {
            cursor: Mutex::new((usize::MAX, 0)),
        }
    }
}

impl ChatObserver for TerminalRenderer {
    fn on_change(&self, conversation: &Conversation, _state: RequestState) {
        let Some(last) = conversation.last() else {
            return;
        };
        if last.role != Role::Model {
            return;
        }

        let index = conversation.len() - 1;
        let mut cursor = self.cursor.lock().unwrap();
        if cursor.0 != index {
            *cursor = (index, 0);
        }

        if last.text.len() < cursor.1 {
            // The trailing message was rewritten wholesale (failure notice)
            println!();
            print!("{}", last.text);
        } else {
            print!("{}", &last.text[cursor.1..]);
        }
        cursor.1 = last.text.len();
        let _ = io::stdout().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("The Occult Oracle");
    println!("=================");
    println!("Ask of the ancient texts. `/topic` summons a question,");
    println!("an empty line sends the pending suggestion, `/quit` departs.\n");

    let mut app = OracleApp::with_observer(Box::new(TerminalRenderer::new()));

    print!("Oracle: ");
    io::stdout().flush()?;
    app.initialize(OracleConfig::default()).await;
    println!("\n");

    if !app.has_session() {
        // The apology is already on screen; without a session every
        // dispatch would be a no-op, so there is nothing left to offer
        return Ok(());
    }

    let suggester = TopicSuggester::stock();
    let stdin = io::stdin();
    let mut pending: Option<String> = None;

    loop {
        print!("You: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim().to_string();

        let input = match line.as_str() {
            "/quit" | "/exit" => break,
            "/topic" => {
                let topic = suggester.suggest().to_string();
                println!("A topic rises from the mist: \"{}\"", topic);
                println!("(press Enter to ask it, or type your own question)\n");
                pending = Some(topic);
                continue;
            }
            "" => match pending.take() {
                Some(topic) => topic,
                None => continue,
            },
            _ => {
                pending = None;
                line
            }
        };

        print!("Oracle: ");
        io::stdout().flush()?;
        app.dispatch(&input).await;
        println!("\n");
    }

    println!("Farewell, seeker.");
    Ok(())
}
