//! Reactions to suspicious requests.

use std::fmt;
use std::io::{self, Write};

use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Response, StatusCode};

use crate::envelope::Envelope;

/// The body of the response sent by [`TerminateHandler`].
pub const FORBIDDEN_CONTENT: &str = "We're not going to handle your request because it looks suspicious.  Please contact us if we've made a mistake.";

/// Reacts to a request the filter chain found suspicious.
pub trait Handler: Send + Sync {
    /// Handles one suspicious request.
    fn handle(&self, envelope: &Envelope);
}

impl<F> Handler for F
where
    F: Fn(&Envelope) + Send + Sync,
{
    fn handle(&self, envelope: &Envelope) {
        self(envelope)
    }
}

/// Does nothing. For detection-only deployments that rely on the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl Handler for NoopHandler {
    fn handle(&self, _envelope: &Envelope) {}
}

/// Builds a `403 Forbidden` HTML response with the given body.
pub fn forbidden_response(content: impl Into<String>) -> Response<String> {
    let mut response = Response::new(content.into());
    *response.status_mut() = StatusCode::FORBIDDEN;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=UTF-8"),
    );
    response
}

/// Delivers a response to the client.
pub trait Responder: Send + Sync {
    /// Sends `response` for the request in `envelope`.
    fn respond(&self, envelope: &Envelope, response: Response<String>);
}

/// Writes the response to standard output in CGI format.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutResponder;

impl StdoutResponder {
    fn write(out: &mut impl Write, response: &Response<String>) -> io::Result<()> {
        let status = response.status();
        write!(
            out,
            "Status: {} {}\r\n",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        )?;
        for (name, value) in response.headers() {
            write!(out, "{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes()))?;
        }
        write!(out, "\r\n{}", response.body())?;
        out.flush()
    }
}

impl Responder for StdoutResponder {
    fn respond(&self, _envelope: &Envelope, response: Response<String>) {
        let stdout = io::stdout();
        if let Err(err) = Self::write(&mut stdout.lock(), &response) {
            tracing::error!(error = %err, "failed to write the forbidden response");
        }
    }
}

/// Stops processing of the current request.
pub trait Terminator: Send + Sync {
    /// Terminates. Real implementations do not return.
    fn terminate(&self);
}

/// Exits the process with status 0.
///
/// Suits one-process-per-request deployments such as CGI.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExit;

impl Terminator for ProcessExit {
    fn terminate(&self) {
        std::process::exit(0);
    }
}

/// Rejects the request with a `403 Forbidden` response, then terminates.
///
/// The response body is [`FORBIDDEN_CONTENT`]. By default the response is
/// written to standard output and the process exits; both steps can be
/// replaced, e.g. to hand the response to a server framework.
pub struct TerminateHandler {
    responder: Box<dyn Responder>,
    terminator: Box<dyn Terminator>,
}

impl TerminateHandler {
    /// Creates a handler that writes to standard output and exits.
    pub fn new() -> Self {
        Self {
            responder: Box::new(StdoutResponder),
            terminator: Box::new(ProcessExit),
        }
    }

    /// Replaces the responder.
    pub fn with_responder(mut self, responder: impl Responder + 'static) -> Self {
        self.responder = Box::new(responder);
        self
    }

    /// Replaces the terminator.
    pub fn with_terminator(mut self, terminator: impl Terminator + 'static) -> Self {
        self.terminator = Box::new(terminator);
        self
    }
}

impl Default for TerminateHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TerminateHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminateHandler").finish_non_exhaustive()
    }
}

impl Handler for TerminateHandler {
    fn handle(&self, envelope: &Envelope) {
        self.responder
            .respond(envelope, forbidden_response(FORBIDDEN_CONTENT));
        self.terminator.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::NullLogger;
    use crate::request::Request;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Journal(Arc<Mutex<Vec<String>>>);

    impl Responder for Journal {
        fn respond(&self, envelope: &Envelope, response: Response<String>) {
            self.0.lock().push(format!(
                "respond {} {} {}",
                envelope.request().uri(),
                response.status().as_u16(),
                response.body()
            ));
        }
    }

    impl Terminator for Journal {
        fn terminate(&self) {
            self.0.lock().push("terminate".to_string());
        }
    }

    fn envelope() -> Envelope {
        Envelope::new(
            Request::get("http://foo.com/").build().unwrap(),
            Arc::new(NullLogger),
        )
    }

    #[test]
    fn forbidden_response_is_a_403_with_the_content() {
        let response = forbidden_response("Go away.");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.body(), "Go away.");
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=UTF-8");
    }

    #[test]
    fn terminate_handler_responds_then_terminates() {
        let journal = Journal::default();
        let handler = TerminateHandler::new()
            .with_responder(journal.clone())
            .with_terminator(journal.clone());

        handler.handle(&envelope());

        let entries = journal.0.lock().clone();
        assert_eq!(
            entries,
            vec![
                format!("respond http://foo.com/ 403 {}", FORBIDDEN_CONTENT),
                "terminate".to_string(),
            ]
        );
    }

    #[test]
    fn stdout_responder_writes_cgi_format() {
        let mut out = Vec::new();
        StdoutResponder::write(&mut out, &forbidden_response("No.")).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Status: 403 Forbidden\r\ncontent-type: text/html; charset=UTF-8\r\n\r\nNo."
        );
    }

    #[test]
    fn closures_are_handlers() {
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let handler = move |_: &Envelope| *counter.lock() += 1;

        handler.handle(&envelope());
        NoopHandler.handle(&envelope());

        assert_eq!(*calls.lock(), 1);
    }
}
