//! Line protocol
//!
//! One request per line, one response line per request:
//!
//! ```text
//! CREATE <name>             SUCCESS: File '<name>' created.
//! LIST                      No files found. | listing joined by " | "
//! WRITE <name> <content>    SUCCESS: <name> is now <N> bytes.
//! READ <name>               SUCCESS: READ <N> bytes. CONTENT: <content>
//! DELETE <name>             File deleted
//! QUIT                      SUCCESS: Disconnecting.
//! ```
//!
//! Command words are case-insensitive. CREATE and READ take the next
//! whitespace-separated token as the filename; WRITE takes the next token
//! as the filename and the trimmed remainder of the line as content;
//! DELETE takes the whole trimmed remainder, so names containing spaces
//! stay deletable. Failures come back as a single `ERROR` line and never
//! end the session; only QUIT does.

use fsys::FsManager;

/// What the connection worker should do after sending the response
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Disconnect,
}

/// Execute one protocol line against the file system
pub fn handle_line(fs: &mut FsManager, line: &str) -> (String, Outcome) {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return (String::from("ERROR: Empty command."), Outcome::Continue);
    }
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };

    match word.to_ascii_uppercase().as_str() {
        "CREATE" => {
            let Some(name) = rest.split_whitespace().next() else {
                return (String::from("ERROR: Missing filename."), Outcome::Continue);
            };
            let reply = match fs.create_file(name) {
                Ok(()) => format!("SUCCESS: File '{}' created.", name),
                Err(err) => format!("ERROR: {}", err),
            };
            (reply, Outcome::Continue)
        }

        "LIST" => {
            let files = fs.list_files();
            let reply = if files.is_empty() {
                String::from("No files found.")
            } else {
                files
                    .iter()
                    .map(|f| {
                        format!(
                            "File Name: {}, File Size: {}, First Block: {}",
                            f.name, f.size, f.first_block
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(" | ")
            };
            (reply, Outcome::Continue)
        }

        "WRITE" => {
            if rest.is_empty() {
                return (
                    String::from("ERROR: Missing filename or content."),
                    Outcome::Continue,
                );
            }
            let (name, content) = match rest.split_once(char::is_whitespace) {
                Some((name, content)) => (name, content.trim()),
                None => (rest, ""),
            };
            if content.is_empty() {
                return (
                    String::from("ERROR: No content provided to write."),
                    Outcome::Continue,
                );
            }
            let reply = match fs.write_file(name, content.as_bytes()) {
                Ok(()) => format!("SUCCESS: {} is now {} bytes.", name, content.len()),
                Err(err) => format!("ERROR: {}", err),
            };
            (reply, Outcome::Continue)
        }

        "READ" => {
            let Some(name) = rest.split_whitespace().next() else {
                return (String::from("ERROR: Missing filename."), Outcome::Continue);
            };
            let reply = match fs.read_file(name) {
                Ok(data) => format!(
                    "SUCCESS: READ {} bytes. CONTENT: {}",
                    data.len(),
                    String::from_utf8_lossy(&data)
                ),
                Err(err) => format!("ERROR: {}", err),
            };
            (reply, Outcome::Continue)
        }

        // DELETE has no trailing punctuation in its replies
        "DELETE" => {
            if rest.is_empty() {
                return (String::from("ERROR: Missing filename"), Outcome::Continue);
            }
            let reply = match fs.delete_file(rest) {
                Ok(()) => String::from("File deleted"),
                Err(err) => format!("ERROR {}", err),
            };
            (reply, Outcome::Continue)
        }

        "QUIT" => (String::from("SUCCESS: Disconnecting."), Outcome::Disconnect),

        _ => (String::from("ERROR: Unknown command."), Outcome::Continue),
    }
}
