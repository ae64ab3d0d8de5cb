//! Integration tests for headerpeek
//!
//! Tests end-to-end producer/consumer workflows across threads, including
//! header sniffing, timeouts and disposal.

use headerpeek::*;
use rand::{Rng, SeedableRng};
use std::io::{Read, SeekFrom};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn short_timeout(ms: u64) -> StreamConfig {
    StreamConfig::default().with_header_ready_timeout(Duration::from_millis(ms))
}

fn read_until_eof(stream: &HeaderPeekStream, buf_len: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = vec![0u8; buf_len];
    loop {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            return out;
        }
        out.extend_from_slice(&buf[..n]);
    }
}

#[test]
fn test_round_trip_preserves_write_order() {
    let stream = HeaderPeekStream::new(StreamConfig::default());
    let writes: Vec<Vec<u8>> = vec![
        b"abc".to_vec(),
        b"defghijklmnop".to_vec(),
        Vec::new(),
        (0..200).map(|i| i as u8).collect(),
        b"z".to_vec(),
    ];
    for w in &writes {
        stream.write(w).unwrap();
    }
    stream.seal().unwrap();

    let expected: Vec<u8> = writes.concat();
    assert_eq!(read_until_eof(&stream, 7), expected);
}

#[test]
fn test_seal_and_dispose_are_idempotent() {
    let stream = HeaderPeekStream::new(StreamConfig::default());
    stream.write(b"payload bytes!").unwrap();
    stream.seal().unwrap();
    stream.seal().unwrap();
    assert_eq!(stream.total_written(), 14);
    assert_eq!(read_until_eof(&stream, 64), b"payload bytes!");

    stream.dispose();
    stream.dispose();
    assert!(stream.is_disposed());
    assert_eq!(stream.total_written(), 14);
}

#[test]
fn test_header_window_seek_and_reread() {
    let stream = HeaderPeekStream::new(StreamConfig::default());
    let head: Vec<u8> = (100..112).collect();
    let body: Vec<u8> = (0..50).collect();
    stream.write(&head).unwrap();
    stream.write(&body).unwrap();
    stream.seal().unwrap();

    assert_eq!(stream.seek(SeekFrom::Start(0)).unwrap(), 0);
    let mut buf = [0u8; 12];
    assert_eq!(stream.read(&mut buf).unwrap(), 12);
    assert_eq!(buf.as_slice(), head.as_slice());

    let err = stream.seek(SeekFrom::Start(13)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

    // Rewind and read everything: header once more, then the body.
    stream.seek(SeekFrom::Start(0)).unwrap();
    let all = read_until_eof(&stream, 16);
    assert_eq!(all, [head, body].concat());
}

#[test]
fn test_partial_header_at_seal() {
    let stream = HeaderPeekStream::new(StreamConfig::default());
    stream.write(b"fLaC!").unwrap();
    stream.seal().unwrap();

    assert_eq!(stream.length().unwrap(), 5);
    let mut buf = [0u8; 12];
    assert_eq!(stream.read(&mut buf).unwrap(), 5);
    assert_eq!(&buf[..5], b"fLaC!");
    assert_eq!(stream.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_concurrent_producer_consumer() {
    let (producer, mut consumer) = channel(short_timeout(5_000));

    let writer = thread::spawn(move || {
        for i in 0..10u8 {
            producer.send(&[i; 1000]).unwrap();
            thread::sleep(Duration::from_millis(5));
        }
        producer.finish().unwrap();
    });

    let start = Instant::now();
    let mut received = Vec::with_capacity(10_000);
    let mut buf = [0u8; 256];
    loop {
        let n = consumer.recv(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        received.extend_from_slice(&buf[..n]);
    }
    writer.join().unwrap();

    assert_eq!(received.len(), 10_000);
    for (i, block) in received.chunks(1000).enumerate() {
        assert!(block.iter().all(|&b| b == i as u8), "block {i} out of order");
    }
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_random_chunking_across_threads() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
    let data: Vec<u8> = (0..50_000).map(|_| rng.gen()).collect();
    let cuts: Vec<usize> = (0..200).map(|_| rng.gen_range(0..700)).collect();

    let (producer, mut consumer) = channel(short_timeout(5_000));
    let source = data.clone();
    let writer = thread::spawn(move || {
        let mut rest = source.as_slice();
        for cut in cuts {
            let (head, tail) = rest.split_at(cut.min(rest.len()));
            producer.send(head).unwrap();
            rest = tail;
        }
        producer.send(rest).unwrap();
    });

    let mut reader_rng = rand::rngs::StdRng::seed_from_u64(0xfeed);
    let mut received = Vec::new();
    let mut buf = vec![0u8; 1024];
    loop {
        let len = reader_rng.gen_range(1..=buf.len());
        let n = consumer.recv(&mut buf[..len]).unwrap();
        if n == 0 {
            break;
        }
        received.extend_from_slice(&buf[..n]);
    }
    writer.join().unwrap();
    assert_eq!(received, data);
}

#[test]
fn test_first_read_times_out_without_data() {
    let stream = HeaderPeekStream::new(short_timeout(150));
    let start = Instant::now();
    let mut buf = [0u8; 16];
    let err = stream.read(&mut buf).unwrap_err();
    let elapsed = start.elapsed();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(elapsed >= Duration::from_millis(140), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "hung: {elapsed:?}");
}

#[test]
fn test_length_times_out_without_data() {
    let stream = HeaderPeekStream::new(short_timeout(100));
    let err = stream.length().unwrap_err();
    assert!(matches!(err, StreamError::Timeout(d) if d == Duration::from_millis(100)));
}

#[test]
fn test_unbounded_header_timeout() {
    let config = StreamConfig::default().with_header_ready_timeout(Duration::MAX);
    let stream = Arc::new(HeaderPeekStream::new(config.clone()));
    let reader = {
        let stream = Arc::clone(&stream);
        thread::spawn(move || {
            let mut buf = [0u8; 16];
            stream.read(&mut buf).map(|n| buf[..n].to_vec())
        })
    };

    thread::sleep(Duration::from_millis(30));
    assert!(!reader.is_finished());
    stream.write(b"fLaC\x00\x00\x00\x22\x10\x00\x10\x00tail").unwrap();
    assert_eq!(reader.join().unwrap().unwrap(), b"fLaC\x00\x00\x00\x22\x10\x00\x10\x00");
    assert_eq!(stream.length().unwrap(), 16);
    stream.seal().unwrap();
    assert_eq!(read_until_eof(&stream, 8), b"tail");

    let short = HeaderPeekStream::new(config);
    short.write(b"abc").unwrap();
    short.seal().unwrap();
    assert_eq!(short.length().unwrap(), 3);
    assert_eq!(read_until_eof(&short, 8), b"abc");
}

#[test]
fn test_seek_while_header_filling() {
    let stream = Arc::new(HeaderPeekStream::new(short_timeout(5_000)));
    stream.write(b"RIF").unwrap();

    assert_eq!(stream.seek(SeekFrom::Start(2)).unwrap(), 2);
    let err = stream.seek(SeekFrom::Start(4)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

    let reader = {
        let stream = Arc::clone(&stream);
        thread::spawn(move || {
            let mut buf = [0u8; 4];
            stream.read(&mut buf).map(|n| buf[..n].to_vec())
        })
    };
    thread::sleep(Duration::from_millis(30));
    assert!(!reader.is_finished(), "read returned before the header was ready");

    stream.write(b"F\x10\x00\x00\x00WAVE").unwrap();
    assert_eq!(reader.join().unwrap().unwrap(), b"FF\x10\x00");
    assert_eq!(stream.position().unwrap(), 6);
}

#[test]
fn test_dispose_wakes_blocked_reader() {
    let stream = Arc::new(HeaderPeekStream::new(short_timeout(5_000)));
    stream.write(&[0u8; 12]).unwrap();
    let mut head = [0u8; 12];
    stream.read(&mut head).unwrap();

    let (tx, rx) = mpsc::channel();
    let reader = {
        let stream = Arc::clone(&stream);
        thread::spawn(move || {
            let mut buf = [0u8; 64];
            tx.send(stream.read(&mut buf)).unwrap();
        })
    };

    thread::sleep(Duration::from_millis(50));
    stream.dispose();

    let outcome = rx.recv_timeout(Duration::from_secs(1)).unwrap();
    assert!(matches!(outcome, Err(StreamError::Disposed)));
    reader.join().unwrap();
}

#[test]
fn test_dispose_wakes_reader_waiting_for_header() {
    let stream = Arc::new(HeaderPeekStream::new(short_timeout(10_000)));
    let reader = {
        let stream = Arc::clone(&stream);
        thread::spawn(move || {
            let start = Instant::now();
            let mut buf = [0u8; 4];
            (stream.read(&mut buf), start.elapsed())
        })
    };

    thread::sleep(Duration::from_millis(30));
    stream.dispose();
    let (outcome, elapsed) = reader.join().unwrap();
    assert!(matches!(outcome, Err(StreamError::Disposed)));
    assert!(elapsed < Duration::from_secs(2));
}

#[test]
fn test_sniff_while_payload_still_arriving() {
    let (producer, mut consumer) = channel(short_timeout(2_000));
    let writer = thread::spawn(move || {
        producer.send(b"OggS\x00\x02\x00\x00").unwrap();
        thread::sleep(Duration::from_millis(20));
        producer.send(b"\x00\x00\x00\x00rest of page").unwrap();
        thread::sleep(Duration::from_millis(20));
        producer.send(&[0xAB; 4096]).unwrap();
    });

    let sniffed = sniff_stream(consumer.stream()).unwrap();
    assert_eq!(sniffed.format, ContainerFormat::Ogg);
    assert_eq!(sniffed.header.len(), 12);

    let mut all = Vec::new();
    consumer.read_to_end(&mut all).unwrap();
    writer.join().unwrap();
    assert_eq!(all.len(), 8 + 16 + 4096);
    assert_eq!(&all[..4], b"OggS");
}

#[test]
fn test_write_after_seal_is_invalid_state() {
    let (producer, consumer) = channel(StreamConfig::default());
    consumer.stream().seal().unwrap();
    let err = producer.send(b"late").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_config_from_json_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stream.json");
    std::fs::write(
        &path,
        r#"{ "header_capacity": 36, "header_ready_timeout_ms": 1500 }"#,
    )
    .unwrap();

    let config = StreamConfig::from_json_file(&path).unwrap();
    assert_eq!(config.header_capacity, 36);
    assert_eq!(config.header_ready_timeout, Duration::from_millis(1500));

    let stream = HeaderPeekStream::new(config);
    stream.write(&[1u8; 40]).unwrap();
    assert_eq!(stream.seek(SeekFrom::Start(36)).unwrap(), 36);
}

#[test]
fn test_config_json_roundtrip_through_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roundtrip.json");

    let config = StreamConfig::default().with_header_capacity(64);
    std::fs::write(&path, config.to_json_pretty().unwrap()).unwrap();
    assert_eq!(StreamConfig::from_json_file(&path).unwrap(), config);
}

#[test]
fn test_feed_file_through_stream() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    let mut data = b"RIFF\x00\x00\x00\x00WAVEfmt ".to_vec();
    data.extend((0..20_000u32).map(|i| (i % 253) as u8));
    std::fs::write(&path, &data).unwrap();

    let (producer, mut consumer) = channel(StreamConfig::default());
    let file = std::fs::File::open(&path).unwrap();
    let feeder = thread::spawn(move || feed_from_reader(file, producer, SMALL_CHUNK_SIZE));

    let sniffed = sniff_stream(consumer.stream()).unwrap();
    assert_eq!(sniffed.format, ContainerFormat::Wav);

    let mut out = Vec::new();
    drain_to_writer(&mut consumer, &mut out, 1000).unwrap();
    assert_eq!(feeder.join().unwrap().unwrap(), data.len() as u64);
    assert_eq!(out, data);
}
