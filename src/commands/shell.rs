/*!
 * Interactive shell
 *
 * Reads one command per line, runs it against a [`Session`] and keeps going
 * after errors. `exit`, `quit` or end of input leave the loop.
 */

use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use super::Session;
use crate::cli_style::{print_error, print_warning};
use crate::error::{PullError, Result};
use crate::protocol::StoreProvider;

/// Prompt printed before every command
pub const PROMPT: &str = "s3pull # ";

/// Text printed by `help` and for unknown commands
pub const HELP: &str = "\
Commands:
s3-object-ls <bucket> [<search-prefix>]
   Lists the objects in a bucket and optionally searches for a specific prefix

s3-bucket-ls
   Lists buckets

s3-object-dl <bucket> <object-key> <local-file>
   Downloads a specific file to the local file system

s3-bucket-dl <bucket> <local-directory> [<modified-after>]
   Downloads an entire bucket to a local directory.
   <modified-after> should be in the format \"2017-12-31\"

help
   Prints this information

exit
   Leaves the shell
";

/// A parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    BucketLs,
    ObjectLs {
        bucket: String,
        prefix: Option<String>,
    },
    ObjectDl {
        bucket: String,
        key: String,
        local_file: PathBuf,
    },
    BucketDl {
        bucket: String,
        local_dir: PathBuf,
        modified_after: Option<String>,
    },
    Help,
    Exit,
    /// Blank line
    Empty,
    /// Anything not recognised; prints help
    Unknown(String),
}

/// Split a command line into words
///
/// Whitespace separates words. Single or double quotes group words, and a
/// backslash escapes whitespace, quotes or another backslash.
pub fn split_command_line(line: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;
    let mut quoted = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_double => {
                in_single = !in_single;
                quoted = true;
            }
            '"' if !in_single => {
                in_double = !in_double;
                quoted = true;
            }
            '\\' if !in_single => match chars.peek().copied() {
                Some(next)
                    if next.is_whitespace() || next == '"' || next == '\'' || next == '\\' =>
                {
                    chars.next();
                    current.push(next);
                }
                _ => current.push('\\'),
            },
            c if c.is_whitespace() && !in_single && !in_double => {
                if !current.is_empty() || quoted {
                    args.push(std::mem::take(&mut current));
                    quoted = false;
                }
                while chars.peek().is_some_and(|next| next.is_whitespace()) {
                    chars.next();
                }
            }
            _ => current.push(c),
        }
    }

    if in_single || in_double {
        return Err(PullError::InvalidArgument(
            "Unclosed quote in command line".to_string(),
        ));
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}

fn usage(text: &str) -> PullError {
    PullError::InvalidArgument(format!("usage: {}", text))
}

/// Parse one input line
pub fn parse_command(line: &str) -> Result<ShellCommand> {
    let mut words = split_command_line(line)?.into_iter();
    let Some(name) = words.next() else {
        return Ok(ShellCommand::Empty);
    };
    let args: Vec<String> = words.collect();

    match name.as_str() {
        "s3-bucket-ls" => Ok(ShellCommand::BucketLs),
        "s3-object-ls" => match args.as_slice() {
            [bucket] => Ok(ShellCommand::ObjectLs {
                bucket: bucket.clone(),
                prefix: None,
            }),
            [bucket, prefix] => Ok(ShellCommand::ObjectLs {
                bucket: bucket.clone(),
                prefix: Some(prefix.clone()),
            }),
            _ => Err(usage("s3-object-ls <bucket> [<search-prefix>]")),
        },
        "s3-object-dl" => match args.as_slice() {
            [bucket, key, local_file] => Ok(ShellCommand::ObjectDl {
                bucket: bucket.clone(),
                key: key.clone(),
                local_file: PathBuf::from(local_file),
            }),
            _ => Err(usage("s3-object-dl <bucket> <object-key> <local-file>")),
        },
        "s3-bucket-dl" => match args.as_slice() {
            [bucket, local_dir] => Ok(ShellCommand::BucketDl {
                bucket: bucket.clone(),
                local_dir: PathBuf::from(local_dir),
                modified_after: None,
            }),
            [bucket, local_dir, date] => Ok(ShellCommand::BucketDl {
                bucket: bucket.clone(),
                local_dir: PathBuf::from(local_dir),
                modified_after: Some(date.clone()),
            }),
            _ => Err(usage(
                "s3-bucket-dl <bucket> <local-directory> [<modified-after yyyy-mm-dd>]",
            )),
        },
        "help" => Ok(ShellCommand::Help),
        "exit" | "quit" => Ok(ShellCommand::Exit),
        other => Ok(ShellCommand::Unknown(other.to_string())),
    }
}

/// Run one parsed command; returns `false` when the shell should stop
pub async fn execute<P>(session: &Session<P>, command: ShellCommand) -> Result<bool>
where
    P: StoreProvider + Clone,
{
    match command {
        ShellCommand::BucketLs => {
            session.bucket_ls().await?;
        }
        ShellCommand::ObjectLs { bucket, prefix } => {
            session.object_ls(&bucket, prefix.as_deref()).await?;
        }
        ShellCommand::ObjectDl {
            bucket,
            key,
            local_file,
        } => {
            session.object_dl(&bucket, &key, &local_file).await?;
        }
        ShellCommand::BucketDl {
            bucket,
            local_dir,
            modified_after,
        } => {
            let report = session
                .bucket_dl(&bucket, &local_dir, modified_after.as_deref(), false)
                .await?;
            if !report.is_success() {
                print_warning(&format!(
                    "{} of {} files failed",
                    report.files_failed(),
                    report.files_failed() + report.files_downloaded
                ));
            }
        }
        ShellCommand::Help | ShellCommand::Unknown(_) => println!("{}", HELP),
        ShellCommand::Empty => {}
        ShellCommand::Exit => return Ok(false),
    }
    Ok(true)
}

/// Read commands from `input` until `exit` or end of input
///
/// Command errors are printed and the loop continues. Only a failure to read
/// input ends the shell with an error.
pub async fn run_shell<P, R>(session: &Session<P>, mut input: R) -> Result<()>
where
    P: StoreProvider + Clone,
    R: AsyncBufRead + Unpin,
{
    println!("Enter a command:");
    let mut stdout = tokio::io::stdout();
    let mut line = String::new();

    loop {
        stdout.write_all(PROMPT.as_bytes()).await?;
        stdout.flush().await?;

        line.clear();
        if input.read_line(&mut line).await? == 0 {
            println!();
            break;
        }

        let command = match parse_command(line.trim()) {
            Ok(command) => command,
            Err(e) => {
                print_error(&e.to_string(), None);
                continue;
            }
        };
        debug!(?command, "Shell command");

        match execute(session, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                warn!(category = %e.category(), error = %e, "Shell command failed");
                print_error(&e.to_string(), suggestion_for(&e));
            }
        }
    }

    Ok(())
}

fn suggestion_for(error: &PullError) -> Option<&'static str> {
    match error {
        PullError::InvalidArgument(msg) if msg.contains("date") => {
            Some("date parameter should be in format 2017-12-31")
        }
        PullError::Storage(e) if e.is_not_found() => Some("check the bucket and key names"),
        _ => None,
    }
}
