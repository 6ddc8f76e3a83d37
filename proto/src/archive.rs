//! Single-file framing for a multi-process tracelog.
//!
//! ```text
//! <pointer size>\n
//! <process count>\n
//! <stream length of process 0>\n
//! ...
//! <stream length of process n-1>\n
//! <stream 0><stream 1>...<stream n-1>
//! <project description tail>
//! ```
//!
//! Each stream is the bincode encoding of one [`ProcessTrace`]. The tail runs to the end of
//! the file and is carried through untouched.

use crate::{
    error::DecodeError,
    id::ProcessId,
    tracelog::{ProcessTrace, Tracelog},
};

pub fn encode(tracelog: &Tracelog) -> Result<Vec<u8>, DecodeError> {
    let streams = tracelog.traces().iter().map(bincode::serialize).collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::new();
    out.extend_from_slice(format!("{}\n{}\n", tracelog.pointer_size(), tracelog.process_count()).as_bytes());
    for stream in &streams {
        out.extend_from_slice(format!("{}\n", stream.len()).as_bytes());
    }
    for stream in &streams {
        out.extend_from_slice(stream);
    }
    out.extend_from_slice(tracelog.project());
    Ok(out)
}

pub fn decode(data: &[u8]) -> Result<Tracelog, DecodeError> {
    let mut rest = data;
    let pointer_size: u8 = read_number(&mut rest, "pointer size")?;
    let process_count: usize = read_number(&mut rest, "process count")?;
    // every stream length takes at least one digit and a newline
    if process_count > rest.len() / 2 {
        return Err(DecodeError::InvalidHeader(format!("process count {process_count} exceeds the header")));
    }

    let mut lengths = Vec::new();
    for _ in 0..process_count {
        lengths.push(read_number::<usize>(&mut rest, "stream length")?);
    }

    let mut traces = Vec::new();
    for (position, len) in lengths.into_iter().enumerate() {
        if rest.len() < len {
            return Err(DecodeError::Truncated { process: ProcessId::new(position), expected: len, available: rest.len() });
        }
        let (stream, tail) = rest.split_at(len);
        let trace: ProcessTrace = bincode::deserialize(stream)?;
        traces.push(trace);
        rest = tail;
    }

    Tracelog::new(pointer_size, traces, rest.to_vec())
}

fn read_number<T: std::str::FromStr>(rest: &mut &[u8], field: &str) -> Result<T, DecodeError> {
    let Some(end) = rest.iter().position(|b| *b == b'\n') else {
        return Err(DecodeError::InvalidHeader(format!("missing {field}")));
    };
    let line = std::str::from_utf8(&rest[..end]).map_err(|_| DecodeError::InvalidHeader(format!("{field} is not text")))?;
    let value = line.trim().parse().map_err(|_| DecodeError::InvalidHeader(format!("{field} {line:?} is not a number")))?;
    *rest = &rest[end + 1..];
    Ok(value)
}
