use mq_stomp::{
    Destination, Mode, Outcome, ReceiveEnd, Reply, Session, SessionConfig, SessionError,
};
use tokio_util::sync::CancellationToken;

use super::args::{Cli, Command};
use super::exit_codes;

/// Run one session as described by the command line.
pub async fn run(cli: &Cli) -> Result<(), (String, u8)> {
    let destination = Destination::new(cli.domain, cli.destination.as_str())
        .map_err(|e| (e.to_string(), exit_codes::USAGE))?;
    let mode = match &cli.command {
        Command::Send { message, count } => {
            Mode::send(message.as_str(), *count).map_err(|e| (e.to_string(), exit_codes::USAGE))?
        }
        Command::Receive => Mode::Receive,
    };
    let config = SessionConfig::new(destination)
        .with_address(cli.address.as_str())
        .with_credentials(cli.login.as_str(), cli.passcode.as_str());

    println!("Connecting to {}...", config.address);
    let session = Session::open(config.clone())
        .await
        .map_err(|e| format_session_error(&e, &config.address))?;

    let cancel = CancellationToken::new();
    if matches!(mode, Mode::Receive) {
        println!("Receiving from {} (Ctrl-C to stop)...", config.destination);
        let token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });
    }

    let outcome = session
        .run(&mode, &cancel, print_reply)
        .await
        .map_err(|e| format_session_error(&e, &config.address))?;

    match outcome {
        Outcome::Sent(report) => {
            println!(
                "Sent {} of {} message(s) to {}",
                report.delivered,
                mode_count(&mode),
                config.destination
            );
            if let Some((index, err)) = report.failure {
                return Err((
                    format!("Message {} failed: {}", index, err),
                    exit_codes::PROTOCOL_ERROR,
                ));
            }
        }
        Outcome::Received(summary) => {
            let why = match summary.end {
                ReceiveEnd::Cancelled => "interrupted",
                ReceiveEnd::StreamClosed => "broker closed the connection",
            };
            println!("Received {} reply(ies); {}", summary.delivered, why);
        }
    }
    println!("Disconnected.");
    Ok(())
}

fn mode_count(mode: &Mode) -> usize {
    match mode {
        Mode::Send { count, .. } => *count,
        Mode::Receive => 0,
    }
}

fn print_reply(reply: &Reply) {
    println!("----");
    print!("{}", reply);
}

/// Map a session error to a console message and exit code.
fn format_session_error(err: &SessionError, address: &str) -> (String, u8) {
    match err {
        SessionError::Io(io_err) => {
            let message = match io_err.kind() {
                std::io::ErrorKind::ConnectionRefused => {
                    format!("Connection refused: {}", address)
                }
                std::io::ErrorKind::TimedOut => {
                    format!("Connection timed out: {}", address)
                }
                _ => format!("Connection failed: {}", io_err),
            };
            (message, exit_codes::NETWORK_ERROR)
        }
        SessionError::ConnectFailure(inner) => match inner.protocol_text() {
            Some(text) => (
                format!("Broker rejected CONNECT:\n{}", text),
                exit_codes::AUTH_ERROR,
            ),
            None => (format!("Connect failed: {}", inner), exit_codes::NETWORK_ERROR),
        },
        SessionError::Transmit(_) | SessionError::Receive(_) => {
            (err.to_string(), exit_codes::NETWORK_ERROR)
        }
        other => (other.to_string(), exit_codes::PROTOCOL_ERROR),
    }
}
