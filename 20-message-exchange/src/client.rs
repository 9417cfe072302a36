use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpStream,
};
use tracing::info;

use crate::{
    channel::{FramedChannel, MessageChannel},
    cli::ClientArgs,
    message::{Message, MessageBody, SenderName},
};

pub async fn run(args: ClientArgs) -> Result<()> {
    let sender = SenderName::new(args.name.clone()).context("invalid client name")?;
    let stream = TcpStream::connect(args.server)
        .await
        .with_context(|| format!("failed to connect to {}", args.server))?;
    info!("connected to {}", args.server);

    let (reader, writer) = stream.into_split();
    let mut channel = FramedChannel::new(BufReader::new(reader), writer);
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    run_session(&mut channel, &sender, stdin, &mut stdout).await
}

/// Maps one line of user input to the message it stands for.
///
/// Returns `None` for blank lines.
pub fn parse_input(line: &str, sender: &SenderName) -> Option<Message> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let body = if trimmed.eq_ignore_ascii_case("logout") {
        MessageBody::Logout
    } else if trimmed.eq_ignore_ascii_case("listusers") {
        MessageBody::ListUsers
    } else {
        MessageBody::Text {
            text: trimmed.to_string(),
        }
    };
    Some(Message::new(sender.clone(), body))
}

/// Client half of a conversation: wait for the greeting, then send one
/// message per input line and print the single reply it earns.
///
/// Ends after the reply to a logout. End of input sends a logout first.
pub async fn run_session<C, I, O>(
    channel: &mut C,
    sender: &SenderName,
    input: I,
    output: &mut O,
) -> Result<()>
where
    C: MessageChannel,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let greeting = channel.receive().await.context("waiting for greeting")?;
    render(output, &greeting).await?;

    let mut lines = input.lines();
    loop {
        let outgoing = match lines.next_line().await? {
            Some(line) => match parse_input(&line, sender) {
                Some(message) => message,
                None => continue,
            },
            None => Message::new(sender.clone(), MessageBody::Logout),
        };

        channel.send(&outgoing).await.context("sending message")?;
        let reply = channel.receive().await.context("waiting for reply")?;
        render(output, &reply).await?;

        if outgoing.is_logout() {
            break;
        }
    }

    channel.close().await?;
    Ok(())
}

async fn render<O>(output: &mut O, message: &Message) -> std::io::Result<()>
where
    O: AsyncWrite + Unpin,
{
    let line = match message.body() {
        MessageBody::Text { text } => format!("<{}> {text}", message.sender()),
        MessageBody::Logout => format!("*** {} logged out", message.sender()),
        MessageBody::ListUsers => format!("*** {} asked for the user list", message.sender()),
    };
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}
