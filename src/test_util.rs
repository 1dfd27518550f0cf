use crate::frame::{Command, FILL_BYTE, FRAME_LEN, HEADER_LEN};
use crate::protocol::Transport;
use byteorder::{ByteOrder, LE};
use hidapi::HidError;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

/// Transport that replays canned responses in order and records every request it was given.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<Vec<u8>, HidError>>>,
    pub requests: RefCell<Vec<Vec<u8>>>,
    pub timeouts: RefCell<Vec<Duration>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: Vec<u8>) -> Self {
        self.responses.borrow_mut().push_back(Ok(response));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses.borrow_mut().push_back(Err(HidError::HidApiError {
            message: message.to_owned(),
        }));
        self
    }

    /// Queue the two responses a healthy controller gives during enumeration.
    pub fn controller(self, index: u8, product: &str, version: &str) -> Self {
        let command = Command::version_for(index).expect("no version command for index");
        self.respond(fw_info_response(0x5a, command, product, version))
            .respond(manufacturer_response(0x5a, "ASUSTeK"))
    }

    pub fn commands(&self) -> Vec<Command> {
        self.requests
            .borrow()
            .iter()
            .map(|r| crate::frame::decode_command(r).unwrap().command)
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn send_and_receive(
        &self,
        _report_id: u8,
        request: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, HidError> {
        self.requests.borrow_mut().push(request.to_vec());
        self.timeouts.borrow_mut().push(timeout);
        self.responses
            .borrow_mut()
            .pop_front()
            .expect("transport ran out of scripted responses")
    }
}

fn header(report_id: u8, command: Command) -> Vec<u8> {
    let mut buf = vec![FILL_BYTE; FRAME_LEN];
    buf[0] = report_id;
    LE::write_u32(&mut buf[1..5], command.into());
    buf[5] = command.record_len() as u8;
    buf
}

fn put_text(buf: &mut [u8], text: &str) {
    buf.fill(0);
    buf[..text.len()].copy_from_slice(text.as_bytes());
}

pub fn fw_info_response(report_id: u8, command: Command, product: &str, version: &str) -> Vec<u8> {
    let mut buf = header(report_id, command);
    buf[6] = 0;
    put_text(&mut buf[7..15], "FGA80100");
    buf[15] = 0;
    put_text(&mut buf[16..22], product);
    buf[22] = 0;
    put_text(&mut buf[23..31], version);
    buf
}

pub fn manufacturer_response(report_id: u8, manufacturer: &str) -> Vec<u8> {
    let mut buf = header(report_id, Command::Manufacturer);
    put_text(&mut buf[HEADER_LEN..31], manufacturer);
    buf
}
