use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box as std_black_box;
use std::time::Instant;
use vtparse::{NullScreen, ParserCore, Screen};

/// Writes `data` into the parser's shared buffer and drives it to
/// completion. `chunk_size` of `None` writes everything in one shot.
fn feed(parser: &mut ParserCore, screen: &mut dyn Screen, data: &[u8], chunk_size: Option<usize>) {
    let chunk_size = chunk_size.unwrap_or(data.len().max(1));
    for chunk in data.chunks(chunk_size) {
        let mut remaining = chunk;
        while !remaining.is_empty() {
            let mut write = parser
                .acquire_write_buffer()
                .expect("benchmark fixtures fit comfortably under BUF_SZ");
            let n = write.bytes().len().min(remaining.len());
            write.bytes()[..n].copy_from_slice(&remaining[..n]);
            write.commit(n);
            remaining = &remaining[n..];
        }
        parser.parse(screen, Instant::now(), true);
    }
}

/// Generate test data with various UTF-8 scenarios
fn generate_test_data() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        // ASCII only
        (
            "ascii_text",
            b"Hello, World! This is a simple ASCII text.".to_vec(),
        ),
        // Mixed ASCII and UTF-8
        (
            "mixed_utf8",
            "Hello 🌍! This is mixed ASCII and UTF-8: café, naïve, 中文"
                .as_bytes()
                .to_vec(),
        ),
        // Heavy UTF-8 content
        (
            "heavy_utf8",
            "🎉🦀🚀 Rust is amazing! 中文测试 العربية русский язык 🌟✨💫"
                .as_bytes()
                .to_vec(),
        ),
        // Terminal escape sequences with UTF-8
        (
            "escape_sequences",
            b"\x1b[31mRed text\x1b[0m Normal \x1b[32m\xF0\x9F\x8C\xB1 Green\x1b[0m".to_vec(),
        ),
        // OSC sequences with UTF-8
        (
            "osc_utf8",
            b"\x1b]2;Terminal Title with UTF-8: \xF0\x9F\x92\xBB\x07".to_vec(),
        ),
        // CSI sequences
        (
            "csi_sequences",
            b"\x1b[1;32mBold Green\x1b[0m \x1b[4mUnderlined\x1b[0m".to_vec(),
        ),
        // Large text block (simulating real terminal output)
        ("large_text", {
            let mut data = Vec::new();
            for i in 0..1000 {
                data.extend_from_slice(
                    format!("Line {}: Hello 🌍 World! 中文 {}\n", i, "🦀".repeat(5)).as_bytes(),
                );
            }
            data
        }),
        // Vim-like output (complex escape sequences)
        ("vim_like", {
            let mut data = Vec::new();
            data.extend_from_slice(b"\x1b[?1049h\x1b[22;0;0t\x1b[1;24r\x1b[?12h\x1b[?12l");
            data.extend_from_slice(b"\x1b[22;2t\x1b[22;1t\x1b[27m\x1b[23m\x1b[29m\x1b[m\x1b[H\x1b[2J");
            data.extend_from_slice("VIM - Vi IMproved 🚀 version 9.0".as_bytes());
            data.extend_from_slice(b"\x1b[1;1H\x1b[42m\x1b[30m  NORMAL  \x1b[m");
            data
        }),
        // Partial UTF-8 sequences (stress test)
        ("partial_utf8", {
            let mut data = Vec::new();
            data.extend_from_slice("Valid: 🦀".as_bytes());
            data.extend_from_slice(&[0xF0, 0x9F]); // Partial 4-byte UTF-8
            data
        }),
        // Invalid UTF-8 mixed with valid
        ("invalid_utf8", {
            let mut data = Vec::new();
            data.extend_from_slice(b"Valid text ");
            data.extend_from_slice(&[0xFF, 0xFE]); // Invalid UTF-8
            data.extend_from_slice(" more valid text".as_bytes());
            data
        }),
    ]
}

fn bench_parser_advance(c: &mut Criterion) {
    let test_data = generate_test_data();

    let mut group = c.benchmark_group("parser_advance");

    for (name, data) in test_data.iter() {
        group.bench_with_input(BenchmarkId::new("advance", name), data, |b, data| {
            b.iter(|| {
                let mut parser = ParserCore::new(0);
                let mut screen = NullScreen;
                feed(&mut parser, &mut screen, std_black_box(data), None);
            });
        });
    }

    group.finish();
}

fn bench_parser_advance_chunked(c: &mut Criterion) {
    let test_data = generate_test_data();

    let mut group = c.benchmark_group("parser_advance_chunked");

    for (name, data) in test_data.iter() {
        if data.len() < 100 {
            continue;
        } // Skip small data for chunked tests

        group.bench_with_input(BenchmarkId::new("chunked_8", name), data, |b, data| {
            b.iter(|| {
                let mut parser = ParserCore::new(0);
                let mut screen = NullScreen;
                feed(&mut parser, &mut screen, std_black_box(data), Some(8));
            });
        });

        group.bench_with_input(BenchmarkId::new("chunked_64", name), data, |b, data| {
            b.iter(|| {
                let mut parser = ParserCore::new(0);
                let mut screen = NullScreen;
                feed(&mut parser, &mut screen, std_black_box(data), Some(64));
            });
        });
    }

    group.finish();
}

fn bench_parser_advance_until_terminated(c: &mut Criterion) {
    /// Stops feeding once it has seen `terminate_at` codepoints.
    /// `ParserCore` has no early-stop signal of its own; a caller just
    /// stops calling `parse`.
    struct TerminatingScreen {
        count: usize,
        terminate_at: usize,
    }

    impl TerminatingScreen {
        fn new(terminate_at: usize) -> Self {
            Self {
                count: 0,
                terminate_at,
            }
        }

        fn terminated(&self) -> bool {
            self.count >= self.terminate_at
        }
    }

    impl Screen for TerminatingScreen {
        fn draw_text(&mut self, codepoints: &[char]) {
            self.count += codepoints.len();
        }
    }

    let test_data = generate_test_data();

    let mut group = c.benchmark_group("parser_advance_until_terminated");

    for (name, data) in test_data.iter() {
        if data.len() < 50 {
            continue;
        } // Skip small data

        group.bench_with_input(
            BenchmarkId::new("terminate_early", name),
            data,
            |b, data| {
                b.iter(|| {
                    let mut parser = ParserCore::new(0);
                    let mut screen = TerminatingScreen::new(10); // Terminate after 10 characters
                    for chunk in std_black_box(data).chunks(8) {
                        if screen.terminated() {
                            break;
                        }
                        feed(&mut parser, &mut screen, chunk, None);
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_utf8_scenarios(c: &mut Criterion) {
    let mut group = c.benchmark_group("utf8_scenarios");

    // Pure ASCII (should be fastest)
    let ascii_data = "a".repeat(1000).into_bytes();
    group.bench_function("pure_ascii_1k", |b| {
        b.iter(|| {
            let mut parser = ParserCore::new(0);
            let mut screen = NullScreen;
            feed(&mut parser, &mut screen, std_black_box(&ascii_data), None);
        });
    });

    // Pure UTF-8 (2-byte characters)
    let utf8_2byte = "é".repeat(1000).into_bytes();
    group.bench_function("utf8_2byte_1k", |b| {
        b.iter(|| {
            let mut parser = ParserCore::new(0);
            let mut screen = NullScreen;
            feed(&mut parser, &mut screen, std_black_box(&utf8_2byte), None);
        });
    });

    // Pure UTF-8 (3-byte characters)
    let utf8_3byte = "中".repeat(1000).into_bytes();
    group.bench_function("utf8_3byte_1k", |b| {
        b.iter(|| {
            let mut parser = ParserCore::new(0);
            let mut screen = NullScreen;
            feed(&mut parser, &mut screen, std_black_box(&utf8_3byte), None);
        });
    });

    // Pure UTF-8 (4-byte characters - emojis)
    let utf8_4byte = "🦀".repeat(1000).into_bytes();
    group.bench_function("utf8_4byte_1k", |b| {
        b.iter(|| {
            let mut parser = ParserCore::new(0);
            let mut screen = NullScreen;
            feed(&mut parser, &mut screen, std_black_box(&utf8_4byte), None);
        });
    });

    group.finish();
}

fn bench_real_world_scenarios(c: &mut Criterion) {
    let mut group = c.benchmark_group("real_world");

    // Simulate ls -la output with UTF-8 filenames
    let ls_output = {
        let mut data = Vec::new();
        for i in 0..100 {
            data.extend_from_slice(
                format!("drwxr-xr-x  2 user group  4096 Jan  1 12:00 📁folder_{i}\n").as_bytes(),
            );
            data.extend_from_slice(
                format!(
                    "-rw-r--r--  1 user group  1024 Jan  1 12:00 📄file_{}_{}.txt\n",
                    i, "🦀"
                )
                .as_bytes(),
            );
        }
        data
    };

    group.bench_function("ls_output", |b| {
        b.iter(|| {
            let mut parser = ParserCore::new(0);
            let mut screen = NullScreen;
            feed(&mut parser, &mut screen, std_black_box(&ls_output), None);
        });
    });

    // Simulate git log output with UTF-8 commit messages
    let git_log = {
        let mut data = Vec::new();
        for i in 0..50 {
            data.extend_from_slice(format!("\x1b[33mcommit abc123{i}\x1b[0m\n").as_bytes());
            data.extend_from_slice("Author: Developer 👨‍💻 <dev@example.com>\n".as_bytes());
            data.extend_from_slice("Date: Mon Jan 1 12:00:00 2024 +0000\n\n".as_bytes());
            data.extend_from_slice(
                format!("    🚀 Add feature {i} with 中文 support\n\n").as_bytes(),
            );
        }
        data
    };

    group.bench_function("git_log", |b| {
        b.iter(|| {
            let mut parser = ParserCore::new(0);
            let mut screen = NullScreen;
            feed(&mut parser, &mut screen, std_black_box(&git_log), None);
        });
    });

    // Simulate cat on a source code file with UTF-8 comments
    let source_code = {
        let mut data = Vec::new();
        for i in 0..200 {
            data.extend_from_slice(
                format!("// This is a comment with UTF-8: 🦀 Rust code line {i}\n").as_bytes(),
            );
            data.extend_from_slice(
                format!("fn function_{i}() -> Result<(), Error> {{\n").as_bytes(),
            );
            data.extend_from_slice("    println!(\"Hello, 世界! 🌍\");\n".as_bytes());
            data.extend_from_slice(b"    Ok(())\n}\n\n");
        }
        data
    };

    group.bench_function("source_code", |b| {
        b.iter(|| {
            let mut parser = ParserCore::new(0);
            let mut screen = NullScreen;
            feed(&mut parser, &mut screen, std_black_box(&source_code), None);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parser_advance,
    bench_parser_advance_chunked,
    bench_parser_advance_until_terminated,
    bench_utf8_scenarios,
    bench_real_world_scenarios
);
criterion_main!(benches);
