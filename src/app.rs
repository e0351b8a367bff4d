use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use bytes::{BufMut, BytesMut};
use log::{debug, info};

use crate::cli::Config;
use crate::output::maybe_escape;

// Renders everything one expression produces into `buf`. Returns how many
// strings it denotes.
fn expand(expr: &str, cfg: &Config, buf: &mut BytesMut) -> Result<usize> {
    let seq = usets::parse(expr).with_context(|| format!("cannot parse {expr:?}"))?;
    let seq = if cfg.reverse { seq.reverse() } else { seq };

    if cfg.show_parse {
        buf.put_slice(format!("{seq}\n").as_bytes());
        return Ok(0);
    }

    let limit = cfg.limit.unwrap_or(usize::MAX);
    let mut emitted = 0;
    for item in seq.strings().take(limit) {
        let s = item.with_context(|| format!("cannot expand {expr:?}"))?;
        if !cfg.count_only {
            if emitted > 0 {
                buf.put_slice(cfg.separator.as_bytes());
            }
            buf.put_slice(maybe_escape(&s, cfg.escape).as_bytes());
        }
        emitted += 1;
    }

    if cfg.count_only {
        buf.put_slice(format!("{emitted}\n").as_bytes());
    } else if emitted > 0 {
        buf.put_u8(b'\n');
    }
    debug!("{expr:?} produced {emitted} strings");
    Ok(emitted)
}

pub fn run(cfg: Config) -> Result<i32> {
    let expressions = if cfg.expressions.is_empty() {
        let stdin = io::stdin();
        let mut lines = Vec::new();
        for line in stdin.lock().lines() {
            let line = line.context("reading stdin")?;
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        lines
    } else {
        cfg.expressions.clone()
    };
    info!("expanding {} expressions", expressions.len());

    let mut stdout = io::stdout().lock();
    let mut total = 0;
    for expr in &expressions {
        let mut buf = BytesMut::new();
        // flush what was produced before a failure, then report it
        let res = expand(expr, &cfg, &mut buf);
        stdout.write_all(&buf).context("writing output")?;
        total += res?;
    }
    stdout.flush().context("writing output")?;

    Ok(if total > 0 || cfg.show_parse { 0 } else { 1 })
}
