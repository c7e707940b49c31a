use std::io::{BufRead, Write};

use crate::prelude::*;

/// Typing any of these ends the chat.
pub const EXIT_KEYWORDS: [&str; 2] = ["quit", "exit"];

const PROMPT: &str = "User: ";

fn is_exit(input: &str) -> bool {
    let input = input.trim();
    EXIT_KEYWORDS
        .iter()
        .any(|keyword| input.eq_ignore_ascii_case(keyword))
}

/// Runs an interactive chat until an exit keyword or the end of `input`.
///
/// Every turn appends the user message, sends the whole conversation, and appends the reply.
/// Endpoint failures are shown as assistant messages and the loop goes on.
///
/// # Errors
///
/// Will return `Err` only if reading `input` or writing `output` fails.
pub fn run<E: Endpoint>(
    session: &Session<E>,
    conversation: &mut Conversation,
    mut input: impl BufRead,
    mut output: impl Write,
    printer: &Printer,
) -> Result<()> {
    writeln!(output, "Starting chat session. Type 'quit' to exit.")?;

    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let mut buf = Vec::new();
        if input.read_until(b'\n', &mut buf)? == 0 {
            log::debug!("end of input");
            writeln!(output)?;
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(&['\r', '\n'][..]);

        if is_exit(line) {
            break;
        }

        if line.trim().is_empty() {
            continue;
        }

        conversation.append_user(line);
        let reply = printer.wait(|| session.respond(conversation).content.clone());

        printer.reply(&mut output, &reply)?;
    }

    log::info!("chat ended after {} messages", conversation.len());

    Ok(())
}

/// Sends a single prompt and writes the result in the requested format.
///
/// `Raw` writes the reply text only, `Json` and `Yaml` write the whole conversation.
///
/// # Errors
///
/// Will return `Err` if the output can't be serialized or written.
pub fn invoke<E: Endpoint>(
    session: &Session<E>,
    conversation: &mut Conversation,
    prompt: impl Into<String>,
    format: Output,
    mut output: impl Write,
    printer: &Printer,
) -> Result<()> {
    conversation.append_user(prompt);
    let reply = printer.wait(|| session.respond(conversation).content.clone());

    match format {
        Output::Raw => writeln!(output, "{reply}")?,
        Output::Json => writeln!(output, "{}", serde_json::to_string_pretty(&*conversation)?)?,
        Output::Yaml => write!(output, "{}", serde_yaml::to_string(&*conversation)?)?,
    }

    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::reply::RawReply;
    use crate::request::Parameters;
    use crate::session::tests::Replay;

    fn chat(content: &str) -> Result<RawReply> {
        Ok(RawReply::Json(
            json!({"choices": [{"message": {"content": content}}]}),
        ))
    }

    fn session(endpoint: &Replay) -> Session<&Replay> {
        Session::new(endpoint, Style::Chat, Parameters::for_style(Style::Chat))
    }

    #[test]
    fn exit_keywords_ignore_case_and_whitespace() {
        for input in ["quit", "EXIT", " Quit ", "exit\t"] {
            assert!(is_exit(input), "{input:?}");
        }
        for input in ["quitting", "", "bye"] {
            assert!(!is_exit(input), "{input:?}");
        }
    }

    #[test]
    fn each_turn_resends_the_whole_history() {
        let endpoint = Replay::new([chat("first answer"), chat("second answer")]);
        let mut conversation = Conversation::new();
        let mut output = Vec::new();

        run(
            &session(&endpoint),
            &mut conversation,
            Cursor::new("first\nsecond\nquit\nnever sent\n"),
            &mut output,
            &Printer::plain(),
        )
        .unwrap();

        let requests = endpoint.requests.borrow();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["messages"].as_array().unwrap().len(), 1);
        assert_eq!(
            requests[1]["messages"],
            json!([
                {"role": "user", "content": "first"},
                {"role": "assistant", "content": "first answer"},
                {"role": "user", "content": "second"},
            ])
        );
        assert_eq!(conversation.len(), 4);

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Assistant: first answer\n"));
        assert!(output.contains("Assistant: second answer\n"));
    }

    #[test]
    fn failures_do_not_end_the_chat() {
        let endpoint = Replay::new([
            Err(Error::Status {
                status: 500,
                body: "boom".into(),
            }),
            chat("recovered"),
        ]);
        let mut conversation = Conversation::new();
        let mut output = Vec::new();

        run(
            &session(&endpoint),
            &mut conversation,
            Cursor::new("one\ntwo\n"),
            &mut output,
            &Printer::plain(),
        )
        .unwrap();

        let contents: Vec<&str> = conversation.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["one", "Error: endpoint returned 500: boom", "two", "recovered"]
        );
    }

    #[test]
    fn blank_lines_are_skipped_and_end_of_input_stops() {
        let endpoint = Replay::new([chat("ok")]);
        let mut conversation = Conversation::with_system("You are a helpful assistant!");

        run(
            &session(&endpoint),
            &mut conversation,
            Cursor::new("\n   \r\nhello\r\n"),
            Vec::new(),
            &Printer::plain(),
        )
        .unwrap();

        assert_eq!(endpoint.requests.borrow().len(), 1);
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.messages()[1], Message::new("hello", Role::User));
    }

    #[test]
    fn invalid_utf8_lines_do_not_end_the_chat() {
        let endpoint = Replay::new([chat("one"), chat("two"), chat("three")]);
        let mut conversation = Conversation::new();
        let mut input = b"hello\n".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, b'\n']);
        input.extend_from_slice(b"still here\nquit\n");

        run(
            &session(&endpoint),
            &mut conversation,
            Cursor::new(input),
            Vec::new(),
            &Printer::plain(),
        )
        .unwrap();

        assert_eq!(endpoint.requests.borrow().len(), 3);
        assert_eq!(conversation.len(), 6);
        assert_eq!(conversation.messages()[2].content, "\u{fffd}\u{fffd}");
        assert_eq!(conversation.messages()[4], Message::new("still here", Role::User));
    }

    #[test]
    fn invoke_writes_the_reply() {
        let endpoint = Replay::new([chat("A managed ML service.")]);
        let mut conversation = Conversation::new();
        let mut output = Vec::new();

        invoke(
            &session(&endpoint),
            &mut conversation,
            "What is SageMaker?",
            Output::Raw,
            &mut output,
            &Printer::plain(),
        )
        .unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "A managed ML service.\n");
    }

    #[test]
    fn invoke_json_writes_the_conversation() {
        let endpoint = Replay::new([chat("A managed ML service.")]);
        let mut conversation = Conversation::new();
        let mut output = Vec::new();

        invoke(
            &session(&endpoint),
            &mut conversation,
            "What is SageMaker?",
            Output::Json,
            &mut output,
            &Printer::plain(),
        )
        .unwrap();

        let written: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(
            written,
            json!([
                {"role": "user", "content": "What is SageMaker?"},
                {"role": "assistant", "content": "A managed ML service."},
            ])
        );
    }
}
