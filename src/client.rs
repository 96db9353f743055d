use bufstream::BufStream;
use std::io::{BufRead, Read, Write};
use std::ops::{Deref, DerefMut};

use super::error::{Error, ParseError, Result, ValidateError};
use super::parse::{
    parse_octets, parse_response, parse_scan_listing, parse_stat, trim_line_ending, unstuff_line,
};
use super::types::*;

const CR: u8 = 0x0d;
const LF: u8 = 0x0a;

/// Longest line accepted from the server, terminator included.
const MAX_LINE_LEN: usize = 1 << 20;

macro_rules! ok_or_unauth_client_err {
    ($r:expr, $self:expr) => {
        match $r {
            Ok(o) => o,
            Err(e) => return Err((e, $self)),
        }
    };
}

fn validate_command(command: &str) -> Result<()> {
    if command.contains('\n') {
        return Err(Error::Validate(ValidateError('\n')));
    }
    if command.contains('\r') {
        return Err(Error::Validate(ValidateError('\r')));
    }
    Ok(())
}

/// The underlying primitives of a POP3 conversation.
///
/// Every method takes `&mut self` and reads the complete response before returning, so there is
/// never more than one command in flight.
#[derive(Debug)]
pub struct Connection<T: Read + Write> {
    pub(crate) stream: BufStream<T>,
}

/// An authenticated POP3 session in the TRANSACTION state.
///
/// Obtained from [`Client::login`]. Messages marked with [`Session::dele`] are only removed once
/// [`Session::quit`] succeeds; dropping the session without quitting leaves the maildrop
/// untouched.
#[derive(Debug)]
pub struct Session<T: Read + Write> {
    conn: Connection<T>,
}

/// A connection to a POP3 server that has not yet authenticated (the AUTHORIZATION state).
///
/// Call [`Client::login`] to move to a [`Session`].
#[derive(Debug)]
pub struct Client<T: Read + Write> {
    conn: Connection<T>,
}

impl<T: Read + Write> Deref for Client<T> {
    type Target = Connection<T>;

    fn deref(&self) -> &Connection<T> {
        &self.conn
    }
}

impl<T: Read + Write> DerefMut for Client<T> {
    fn deref_mut(&mut self) -> &mut Connection<T> {
        &mut self.conn
    }
}

impl<T: Read + Write> Deref for Session<T> {
    type Target = Connection<T>;

    fn deref(&self) -> &Connection<T> {
        &self.conn
    }
}

impl<T: Read + Write> DerefMut for Session<T> {
    fn deref_mut(&mut self) -> &mut Connection<T> {
        &mut self.conn
    }
}

impl<T: Read + Write> Client<T> {
    /// Creates a new client over the given stream.
    ///
    /// This method primarily exists for writing tests that mock the underlying transport, and for
    /// transports [`ClientBuilder`](crate::ClientBuilder) does not know how to build. Remember to
    /// call [`Connection::read_greeting`] before issuing commands.
    pub fn new(stream: T) -> Client<T> {
        Client {
            conn: Connection {
                stream: BufStream::new(stream),
            },
        }
    }

    /// Log in with `USER` and `PASS`.
    ///
    /// On failure the client is handed back alongside the error so the caller may inspect it or
    /// reuse the connection:
    ///
    /// ```no_run
    /// # fn main() -> popdir::Result<()> {
    /// let client = popdir::ClientBuilder::new("pop.example.com", 995).connect()?;
    /// let mut session = match client.login("user", "secret") {
    ///     Ok(s) => s,
    ///     Err((e, _client)) => return Err(e),
    /// };
    /// session.quit()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn login<U: AsRef<str>, P: AsRef<str>>(
        mut self,
        username: U,
        password: P,
    ) -> ::std::result::Result<Session<T>, (Error, Client<T>)> {
        ok_or_unauth_client_err!(
            self.run_command(&format!("USER {}", username.as_ref())),
            self
        );
        ok_or_unauth_client_err!(
            self.run_command(&format!("PASS {}", password.as_ref())),
            self
        );
        Ok(Session { conn: self.conn })
    }

    /// Consume the client and return the underlying stream.
    pub fn into_inner(self) -> Result<T> {
        let res = self.conn.stream.into_inner()?;
        Ok(res)
    }
}

impl<T: Read + Write> Session<T> {
    /// `STAT`: number of messages and total size of the maildrop.
    pub fn stat(&mut self) -> Result<Stat> {
        let text = self.run_command("STAT")?;
        Ok(parse_stat(&text)?)
    }

    /// `LIST <index>`: the size of one message.
    pub fn list(&mut self, index: u32) -> Result<ScanListing> {
        let text = self.run_command(&format!("LIST {}", index))?;
        Ok(parse_scan_listing(&text)?)
    }

    /// `RETR <index>`: download one message.
    pub fn retr(&mut self, index: u32) -> Result<Message> {
        let (text, body) = self.run_multiline_command(&format!("RETR {}", index))?;
        Ok(Message {
            octets: parse_octets(&text),
            body,
        })
    }

    /// `DELE <index>`: mark a message for deletion when the session ends.
    pub fn dele(&mut self, index: u32) -> Result<()> {
        self.run_command(&format!("DELE {}", index)).map(|_| ())
    }

    /// `RSET`: unmark every message marked for deletion in this session.
    pub fn rset(&mut self) -> Result<()> {
        self.run_command("RSET").map(|_| ())
    }

    /// `NOOP` always succeeds, and it does nothing.
    pub fn noop(&mut self) -> Result<()> {
        self.run_command("NOOP").map(|_| ())
    }

    /// `QUIT`: enter the UPDATE state, letting the server remove messages marked with
    /// [`Session::dele`], and close the session. Returns the server's farewell text.
    pub fn quit(mut self) -> Result<String> {
        self.run_command("QUIT")
    }
}

impl<T: Read + Write> Connection<T> {
    /// Read the server greeting, which must be a `+OK` line.
    pub fn read_greeting(&mut self) -> Result<String> {
        self.read_status()
    }

    /// Send a command that is answered by a single status line and return the status text.
    ///
    /// A `-ERR` answer is returned as [`Error::Rejected`] with the server's explanation.
    pub fn run_command(&mut self, command: &str) -> Result<String> {
        validate_command(command)?;
        self.write_line(command.as_bytes())?;
        self.read_status()
    }

    /// Send a command that is answered by a status line and, if the status is `+OK`, a
    /// dot-terminated body. Returns the status text and the decoded body.
    ///
    /// On `-ERR` no body follows and none is read.
    pub fn run_multiline_command(&mut self, command: &str) -> Result<(String, Vec<u8>)> {
        let text = self.run_command(command)?;
        let body = self.read_body()?;
        Ok((text, body))
    }

    fn read_status(&mut self) -> Result<String> {
        let mut v = Vec::new();
        self.readline(&mut v)?;
        let line = String::from_utf8_lossy(trim_line_ending(&v));
        tracing::trace!("S: {}", line);
        let response = parse_response(&line).map_err(Error::Parse)?;
        match response.status {
            Status::Ok => Ok(response.text),
            Status::Err => Err(Error::Rejected(response.text)),
        }
    }

    fn read_body(&mut self) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            self.readline(&mut line)?;
            match unstuff_line(&line) {
                Some(data) => body.extend_from_slice(data),
                None => break,
            }
        }
        tracing::trace!("S: <{} octets>", body.len());
        Ok(body)
    }

    fn readline(&mut self, into: &mut Vec<u8>) -> Result<usize> {
        let read = (&mut self.stream)
            .take(MAX_LINE_LEN as u64)
            .read_until(LF, into)?;
        if read == 0 {
            return Err(Error::ConnectionLost);
        }
        if read == MAX_LINE_LEN && !into.ends_with(&[LF]) {
            return Err(Error::Parse(ParseError::LineTooLong(MAX_LINE_LEN)));
        }
        Ok(read)
    }

    pub(crate) fn write_line(&mut self, buf: &[u8]) -> Result<()> {
        self.stream.write_all(buf)?;
        self.stream.write_all(&[CR, LF])?;
        self.stream.flush()?;
        if buf.starts_with(b"PASS ") {
            tracing::trace!("C: PASS <redacted>");
        } else {
            tracing::trace!("C: {}", String::from_utf8_lossy(buf));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::error::Result;
    use super::super::mock_stream::MockStream;
    use super::*;

    fn session(response: &[u8]) -> Session<MockStream> {
        Session {
            conn: Client::new(MockStream::new(response.to_vec())).conn,
        }
    }

    fn written(session: &Session<MockStream>) -> &[u8] {
        &session.stream.get_ref().written_buf
    }

    #[test]
    fn read_greeting() {
        let greeting = "+OK POP3 server ready <1896.697170952@dbc.mtview.ca.us>\r\n";
        let mock_stream = MockStream::new(greeting.as_bytes().to_vec());
        let mut client = Client::new(mock_stream);
        assert_eq!(
            client.read_greeting().unwrap(),
            "POP3 server ready <1896.697170952@dbc.mtview.ca.us>"
        );
    }

    #[test]
    fn read_greeting_rejected() {
        let mock_stream = MockStream::new(b"-ERR go away\r\n".to_vec());
        let mut client = Client::new(mock_stream);
        match client.read_greeting() {
            Err(Error::Rejected(text)) => assert_eq!(text, "go away"),
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn readline_delay_read() {
        let greeting = "+OK ready\r\n";
        let mock_stream = MockStream::default()
            .with_buf(greeting.as_bytes().to_vec())
            .with_delay();
        let mut client = Client::new(mock_stream);
        let mut v = Vec::new();
        client.readline(&mut v).unwrap();
        assert_eq!(String::from_utf8(v).unwrap(), greeting);
    }

    #[test]
    fn readline_eof() {
        let mock_stream = MockStream::default().with_eof();
        let mut client = Client::new(mock_stream);
        let mut v = Vec::new();
        if let Err(Error::ConnectionLost) = client.readline(&mut v) {
        } else {
            unreachable!("EOF read did not return connection lost");
        }
    }

    #[test]
    fn readline_err() {
        let mock_stream = MockStream::default().with_err();
        let mut client = Client::new(mock_stream);
        let mut v = Vec::new();
        assert!(matches!(client.readline(&mut v), Err(Error::Io(_))));
    }

    #[test]
    fn run_command_writes_crlf_line() {
        let mut client = Client::new(MockStream::new(b"+OK fine\r\n".to_vec()));
        assert_eq!(client.run_command("NOOP").unwrap(), "fine");
        assert_eq!(client.stream.get_ref().written_buf, b"NOOP\r\n".to_vec());
    }

    #[test]
    fn run_command_rejected_carries_text() {
        let mut client = Client::new(MockStream::new(b"-ERR no such message\r\n".to_vec()));
        match client.run_command("DELE 9") {
            Err(Error::Rejected(text)) => assert_eq!(text, "no such message"),
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn run_command_malformed_status() {
        let mut client = Client::new(MockStream::new(b"MAYBE something\r\n".to_vec()));
        match client.run_command("NOOP") {
            Err(Error::Parse(ParseError::Status(token))) => assert_eq!(token, "MAYBE"),
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn run_command_rejects_line_breaks() {
        let mut client = Client::new(MockStream::default());
        match client.run_command("USER a\r\nDELE 1") {
            Err(Error::Validate(ValidateError('\n'))) => {}
            r => panic!("unexpected {:?}", r),
        }
        assert!(client.stream.get_ref().written_buf.is_empty());
    }

    #[test]
    fn multiline_reads_to_terminator() {
        let response = b"+OK 2 lines\r\nline one\r\nline two\r\n.\r\n+OK\r\n".to_vec();
        let mut client = Client::new(MockStream::new(response));
        let (text, body) = client.run_multiline_command("TOP 1 0").unwrap();
        assert_eq!(text, "2 lines");
        assert_eq!(body, b"line one\r\nline two\r\n".to_vec());
        // the next response is still intact
        assert_eq!(client.run_command("NOOP").unwrap(), "");
    }

    #[test]
    fn multiline_unstuffs_dots() {
        let response = b"+OK\r\n..\r\n...\r\n..x\r\n.\r\n".to_vec();
        let mut client = Client::new(MockStream::new(response));
        let (_, body) = client.run_multiline_command("RETR 1").unwrap();
        assert_eq!(body, b".\r\n..\r\n.x\r\n".to_vec());
    }

    #[test]
    fn multiline_rejected_reads_no_body() {
        let response = b"-ERR no such message\r\n+OK\r\n".to_vec();
        let mut client = Client::new(MockStream::new(response));
        assert!(matches!(
            client.run_multiline_command("RETR 7"),
            Err(Error::Rejected(_))
        ));
        client.run_command("NOOP").unwrap();
    }

    #[test]
    fn multiline_eof_before_terminator() {
        let mock_stream = MockStream::new(b"+OK\r\npartial\r\n".to_vec()).with_eof_at_end();
        let mut client = Client::new(mock_stream);
        assert!(matches!(
            client.run_multiline_command("RETR 1"),
            Err(Error::ConnectionLost)
        ));
    }

    #[test]
    fn overlong_status_line() {
        let mut response = vec![b'+'; MAX_LINE_LEN];
        response.extend_from_slice(b"\r\n");
        let mut client = Client::new(MockStream::new(response));
        assert!(matches!(
            client.read_greeting(),
            Err(Error::Parse(ParseError::LineTooLong(MAX_LINE_LEN)))
        ));
    }

    #[test]
    fn overlong_body_line() {
        let mut response = b"+OK\r\n".to_vec();
        response.extend(std::iter::repeat(b'x').take(MAX_LINE_LEN + 1));
        let mut client = Client::new(MockStream::new(response));
        assert!(matches!(
            client.run_multiline_command("RETR 1"),
            Err(Error::Parse(ParseError::LineTooLong(_)))
        ));
    }

    #[test]
    fn body_line_at_limit() {
        let mut line = vec![b'x'; MAX_LINE_LEN - 2];
        line.extend_from_slice(b"\r\n");
        let mut response = b"+OK\r\n".to_vec();
        response.extend_from_slice(&line);
        response.extend_from_slice(b".\r\n");
        let mut client = Client::new(MockStream::new(response));
        let (_, body) = client.run_multiline_command("RETR 1").unwrap();
        assert_eq!(body, line);
    }

    #[test]
    fn login() {
        let response = b"+OK send PASS\r\n+OK maildrop locked and ready\r\n".to_vec();
        let client = Client::new(MockStream::new(response));
        let session = client.login("username", "password").unwrap();
        assert_eq!(
            written(&session),
            b"USER username\r\nPASS password\r\n".to_vec()
        );
    }

    #[test]
    fn login_bad_user_stops_before_pass() {
        let response = b"-ERR never heard of mrose\r\n".to_vec();
        let client = Client::new(MockStream::new(response));
        let (e, client) = client.login("mrose", "secret").unwrap_err();
        assert!(matches!(e, Error::Rejected(ref t) if t == "never heard of mrose"));
        assert_eq!(client.stream.get_ref().written_buf, b"USER mrose\r\n".to_vec());
    }

    #[test]
    fn login_bad_password() {
        let response = b"+OK\r\n-ERR invalid password\r\n".to_vec();
        let client = Client::new(MockStream::new(response));
        let (e, _) = client.login("mrose", "wrong").unwrap_err();
        assert!(matches!(e, Error::Rejected(ref t) if t == "invalid password"));
    }

    #[test]
    fn stat() {
        let mut session = session(b"+OK 3 1500\r\n");
        assert_eq!(
            session.stat().unwrap(),
            Stat {
                count: 3,
                size: 1500
            }
        );
        assert_eq!(written(&session), b"STAT\r\n");
    }

    #[test]
    fn stat_malformed() {
        let mut session = session(b"+OK three\r\n");
        assert!(matches!(
            session.stat(),
            Err(Error::Parse(ParseError::Stat(_)))
        ));
    }

    #[test]
    fn list() {
        let mut session = session(b"+OK 2 200\r\n");
        assert_eq!(
            session.list(2).unwrap(),
            ScanListing {
                index: 2,
                size: 200
            }
        );
        assert_eq!(written(&session), b"LIST 2\r\n");
    }

    #[test]
    fn retr() {
        let response = b"+OK 30 octets\r\nSubject: test\r\n\r\n..hidden dot\r\n.\r\n";
        let mut session = session(response);
        let message = session.retr(2).unwrap();
        assert_eq!(message.octets, Some(30));
        assert_eq!(message.len(), 30);
        assert_eq!(message.body, b"Subject: test\r\n\r\n.hidden dot\r\n".to_vec());
        assert_eq!(written(&session), b"RETR 2\r\n");
    }

    #[test]
    fn retr_without_octets() {
        let mut session = session(b"+OK message follows\r\nhi\r\n.\r\n");
        let message = session.retr(1).unwrap();
        assert_eq!(message.octets, None);
        assert_eq!(message.body, b"hi\r\n");
    }

    fn simple<F>(cmd: &str, op: F)
    where
        F: FnOnce(&mut Session<MockStream>) -> Result<()>,
    {
        let mut session = session(b"+OK\r\n");
        op(&mut session).unwrap();
        assert_eq!(
            written(&session),
            format!("{}\r\n", cmd).as_bytes(),
            "Invalid {} command",
            cmd
        );
    }

    #[test]
    fn dele() {
        simple("DELE 5", |s| s.dele(5));
    }

    #[test]
    fn rset() {
        simple("RSET", |s| s.rset());
    }

    #[test]
    fn noop() {
        simple("NOOP", |s| s.noop());
    }

    #[test]
    fn quit() {
        let session = session(b"+OK dewey POP3 server signing off\r\n");
        assert_eq!(session.quit().unwrap(), "dewey POP3 server signing off");
    }
}
