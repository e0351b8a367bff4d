use anyhow::{Context, Result, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub expressions: Vec<String>, // read from stdin when empty
    pub separator: String,
    pub count_only: bool,
    pub show_parse: bool,
    pub escape: bool,
    pub limit: Option<usize>,
    pub reverse: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            expressions: Vec::new(),
            separator: "\n".to_string(),
            count_only: false,
            show_parse: false,
            escape: false,
            limit: None,
            reverse: false,
        }
    }
}

pub const USAGE: &str = "usage: usets [-n] [-r] [--parse] [--escape] [-s SEP] [-l N] [--] [EXPR...]";

pub fn parse_args(args: Vec<String>) -> Result<Config> {
    let mut cfg = Config::default();
    let mut args = args.into_iter().skip(1);
    let mut options_done = false;

    while let Some(arg) = args.next() {
        if options_done || arg == "-" || !arg.starts_with('-') {
            cfg.expressions.push(arg);
            continue;
        }
        match arg.as_str() {
            "--" => options_done = true,
            "-n" => cfg.count_only = true,
            "-r" => cfg.reverse = true,
            "--parse" => cfg.show_parse = true,
            "--escape" => cfg.escape = true,
            "-s" => {
                let raw = args.next().context("-s needs a separator")?;
                // lets the shell pass "\t" or "\u{2028}"
                cfg.separator = usets::unescape(&raw, &[])
                    .with_context(|| format!("bad separator {raw:?}"))?;
            }
            "-l" => {
                let raw = args.next().context("-l needs a count")?;
                let n = raw
                    .parse()
                    .with_context(|| format!("bad limit {raw:?}"))?;
                cfg.limit = Some(n);
            }
            other => bail!("unknown option {other}\n{USAGE}"),
        }
    }
    Ok(cfg)
}
