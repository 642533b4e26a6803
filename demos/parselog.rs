//! Parse input from stdin and log dispatched screen operations on stdout.
use std::io::{self, Read};
use std::time::Instant;

use vtparse::{ParserCore, Payload, PendingToken, Region, Screen};

/// A `Screen` that just logs every call it receives.
struct Log;

impl Screen for Log {
    fn draw_text(&mut self, codepoints: &[char]) {
        println!("[draw_text] {:?}", codepoints);
    }

    fn bell(&mut self) {
        println!("[bell]");
    }

    fn linefeed(&mut self) {
        println!("[linefeed]");
    }

    fn carriage_return(&mut self) {
        println!("[carriage_return]");
    }

    fn cursor_position(&mut self, row: i32, col: i32) {
        println!("[cursor_position] row={} col={}", row, col);
    }

    fn apply_sgr(&mut self, params: &[i32], is_sub_group: bool, region: Option<Region>) {
        println!(
            "[apply_sgr] params={:?} is_sub_group={} region={:?}",
            params, is_sub_group, region
        );
    }

    fn set_mode(&mut self, code: i32) {
        println!("[set_mode] {}", code);
    }

    fn reset_mode(&mut self, code: i32) {
        println!("[reset_mode] {}", code);
    }

    fn set_title(&mut self, title: &str) {
        println!("[set_title] {:?}", title);
    }

    fn set_active_hyperlink(&mut self, id: Option<&str>, url: Option<&str>) {
        println!("[set_active_hyperlink] id={:?} url={:?}", id, url);
    }

    fn pause_rendering(&mut self, on: bool, token: PendingToken) -> bool {
        println!("[pause_rendering] on={} token={:?}", on, token);
        true
    }

    fn request_capabilities(&mut self, kind: i32, payload: Payload<'_>) {
        println!("[request_capabilities] kind={} payload={:?}", kind, payload);
    }
}

fn main() {
    let input = io::stdin();
    let mut handle = input.lock();

    let mut parser = ParserCore::new(0);
    let mut screen = Log;

    let mut buf = [0u8; 2048];

    loop {
        match handle.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let mut written = 0;
                while written < n {
                    let Some(mut write) = parser.acquire_write_buffer() else {
                        parser.parse(&mut screen, Instant::now(), true);
                        continue;
                    };
                    let chunk = write.bytes().len().min(n - written);
                    write.bytes()[..chunk].copy_from_slice(&buf[written..written + chunk]);
                    write.commit(chunk);
                    written += chunk;
                }
                parser.parse(&mut screen, Instant::now(), true);
            }
            Err(err) => {
                println!("err: {}", err);
                break;
            }
        }
    }
}
