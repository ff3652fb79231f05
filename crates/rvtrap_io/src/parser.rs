//! Parser for trap trace files.
//!
//! A trace is a sequence of events replayed against simulated harts, one per
//! line. `#` starts a comment. A line may be addressed to a single hart with
//! an `@<hart>` prefix; unaddressed lines apply to every hart.
//!
//! ```text
//! init
//! enable msoft
//! global on
//! soft                          # raise the machine software interrupt
//! @1 raise mtimer               # timer comparator fires on hart 1
//! trap 0x8000000000000009       # supervisor external, delivered directly
//! trap 2                        # illegal instruction: halts the hart
//! ```

use anyhow::{Result, anyhow};
use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{alphanumeric1, digit1, hex_digit1, space0, space1};
use nom::combinator::{all_consuming, map, map_opt, map_res, opt, value};
use nom::sequence::{delimited, preceded, terminated};
use rvtrap_core::InterruptSource;

/// One replayable event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// Controller initialization.
    Init,
    /// Global machine interrupt enable on or off.
    Global(bool),
    Enable(InterruptSource),
    Disable(InterruptSource),
    /// Software trigger of the machine software interrupt.
    Soft,
    ClearSoft,
    /// A device raises the pending line of a source.
    Raise(InterruptSource),
    /// The trap vector is entered with this raw XLEN `mcause` value,
    /// regardless of enable state.
    Trap(u64),
    ResetStats,
}

/// An event with its source line and optional hart address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceLine {
    pub line: usize,
    pub hart: Option<usize>,
    pub event: TraceEvent,
}

impl TraceLine {
    /// True when this line applies to `hart`.
    pub fn targets(&self, hart: usize) -> bool {
        self.hart.is_none_or(|h| h == hart)
    }
}

/// Decimal or `0x`-prefixed hexadecimal unsigned integer.
pub fn number(input: &str) -> IResult<&str, u64> {
    alt((
        map_res(preceded(alt((tag("0x"), tag("0X"))), hex_digit1), |hex| {
            u64::from_str_radix(hex, 16)
        }),
        map_res(digit1, |dec: &str| dec.parse::<u64>()),
    ))(input)
}

/// Parses a whole string as a number, for command-line arguments.
pub fn parse_number(text: &str) -> Result<u64> {
    let (_, n) = all_consuming(number)(text.trim())
        .map_err(|_| anyhow!("expected a decimal or 0x-prefixed number, got `{text}`"))?;
    Ok(n)
}

fn source(input: &str) -> IResult<&str, InterruptSource> {
    map_opt(alphanumeric1, InterruptSource::from_name)(input)
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(word), space1)
}

fn event(input: &str) -> IResult<&str, TraceEvent> {
    alt((
        value(TraceEvent::Init, tag("init")),
        map(
            preceded(keyword("global"), alt((value(true, tag("on")), value(false, tag("off"))))),
            TraceEvent::Global,
        ),
        map(preceded(keyword("enable"), source), TraceEvent::Enable),
        map(preceded(keyword("disable"), source), TraceEvent::Disable),
        map(preceded(keyword("raise"), source), TraceEvent::Raise),
        value(TraceEvent::ClearSoft, tag("clear-soft")),
        value(TraceEvent::Soft, tag("soft")),
        map(preceded(keyword("trap"), number), TraceEvent::Trap),
        value(TraceEvent::ResetStats, tag("reset")),
    ))(input)
}

fn hart_prefix(input: &str) -> IResult<&str, usize> {
    map_res(delimited(tag("@"), digit1, space1), |id: &str| id.parse::<usize>())(input)
}

fn statement(input: &str) -> IResult<&str, (Option<usize>, TraceEvent)> {
    let (input, hart) = opt(hart_prefix)(input)?;
    let (input, event) = terminated(event, space0)(input)?;
    Ok((input, (hart, event)))
}

/// Parses one line. Blank and comment-only lines yield `None`.
pub fn parse_line(text: &str) -> Result<Option<(Option<usize>, TraceEvent)>> {
    let code = text.split('#').next().unwrap_or_default().trim();
    if code.is_empty() {
        return Ok(None);
    }
    let (_, parsed) =
        all_consuming(statement)(code).map_err(|_| anyhow!("unrecognized event `{code}`"))?;
    Ok(Some(parsed))
}

/// Parses a whole trace, numbering lines from 1.
pub fn parse_trace(text: &str) -> Result<Vec<TraceLine>> {
    let mut lines = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let parsed = parse_line(raw).map_err(|err| anyhow!("line {line}: {err}"))?;
        if let Some((hart, event)) = parsed {
            lines.push(TraceLine { line, hart, event });
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_event_kind() {
        let cases = [
            ("init", TraceEvent::Init),
            ("global on", TraceEvent::Global(true)),
            ("global   off", TraceEvent::Global(false)),
            ("enable mtimer", TraceEvent::Enable(InterruptSource::MachineTimer)),
            ("disable mext", TraceEvent::Disable(InterruptSource::MachineExternal)),
            ("raise mext", TraceEvent::Raise(InterruptSource::MachineExternal)),
            ("soft", TraceEvent::Soft),
            ("clear-soft", TraceEvent::ClearSoft),
            ("trap 0x8000000000000007", TraceEvent::Trap(0x8000_0000_0000_0007)),
            ("trap 2", TraceEvent::Trap(2)),
            ("reset", TraceEvent::ResetStats),
        ];
        for (text, expected) in cases {
            assert_eq!(parse_line(text).unwrap(), Some((None, expected)), "{text}");
        }
    }

    #[test]
    fn hart_prefix_and_comments() {
        assert_eq!(
            parse_line("@3 soft   # poke hart 3").unwrap(),
            Some((Some(3), TraceEvent::Soft))
        );
        assert_eq!(parse_line("   # nothing here").unwrap(), None);
        assert_eq!(parse_line("").unwrap(), None);
    }

    #[test]
    fn rejects_trailing_garbage_and_unknown_sources() {
        assert!(parse_line("soft now").is_err());
        assert!(parse_line("enable stimer").is_err());
        assert!(parse_line("enablemsoft").is_err());
        assert!(parse_line("trap 0xZZ").is_err());
    }

    #[test]
    fn sources_use_their_controller_names() {
        for src in InterruptSource::ALL {
            let text = format!("disable {}", src.name());
            assert_eq!(parse_line(&text).unwrap(), Some((None, TraceEvent::Disable(src))));
        }
    }

    #[test]
    fn trace_errors_carry_line_numbers() {
        let err = parse_trace("init\n\nglobal maybe\n").unwrap_err();
        assert!(err.to_string().starts_with("line 3:"), "{err}");
    }

    #[test]
    fn lines_target_their_hart() {
        let trace = parse_trace("init\n@1 soft\n").unwrap();
        assert_eq!(trace[0].line, 1);
        assert!(trace[0].targets(0) && trace[0].targets(1));
        assert_eq!(trace[1].line, 2);
        assert!(!trace[1].targets(0) && trace[1].targets(1));
    }

    #[test]
    fn numbers_accept_both_radixes() {
        assert_eq!(parse_number("0x888").unwrap(), 0x888);
        assert_eq!(parse_number(" 2184 ").unwrap(), 2184);
        assert!(parse_number("-1").is_err());
    }
}
