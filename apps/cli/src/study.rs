//! Interactive study loop over line-based input.

use anyhow::Result;
use std::io::{BufRead, Write};
use study_core::{Answer, Card, RandomSource, SessionSummary, StudyList, StudySession};

/// What the user chose after seeing the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reply {
    Correct,
    Wrong,
    Skip,
    Quit,
}

fn parse_reply(line: &str) -> Option<Reply> {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(Reply::Correct),
        "n" | "no" => Some(Reply::Wrong),
        "s" | "skip" => Some(Reply::Skip),
        "q" | "quit" => Some(Reply::Quit),
        _ => None,
    }
}

/// Run a session until the user quits, input ends, or `limit` cards have
/// been answered.
pub fn run_session<R, I, O>(
    list: &mut StudyList,
    rng: R,
    limit: Option<u32>,
    input: &mut I,
    output: &mut O,
) -> Result<SessionSummary>
where
    R: RandomSource,
    I: BufRead,
    O: Write,
{
    let mut session = StudySession::start(list, rng)?;

    'cards: while limit.map_or(true, |limit| session.summary().answered < limit) {
        let card = session.current_card()?;
        write_card(output, &card)?;
        write!(output, "[Enter] show answer, [q] quit: ")?;
        output.flush()?;

        let Some(line) = read_line(input)? else {
            break;
        };
        if parse_reply(&line) == Some(Reply::Quit) {
            break;
        }

        if let Some(answer) = session.reveal_answer()? {
            write_answer(output, &answer)?;
        }

        loop {
            write!(output, "Correct? [y]es, [n]o, [s]kip, [q]uit: ")?;
            output.flush()?;
            let Some(line) = read_line(input)? else {
                break 'cards;
            };
            match parse_reply(&line) {
                Some(Reply::Correct) => session.answer(true)?,
                Some(Reply::Wrong) => session.answer(false)?,
                Some(Reply::Skip) => session.skip()?,
                Some(Reply::Quit) => break 'cards,
                None => continue,
            }
            break;
        }
    }

    let summary = session.finish();
    writeln!(output)?;
    writeln!(
        output,
        "Answered {} ({} correct, {:.0}%), skipped {}.",
        summary.answered,
        summary.correct,
        summary.accuracy() * 100.0,
        summary.skipped
    )?;
    Ok(summary)
}

fn read_line<I: BufRead>(input: &mut I) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn write_card<O: Write>(output: &mut O, card: &Card) -> Result<()> {
    writeln!(output)?;
    if card.reversed {
        writeln!(output, "(reversed)")?;
    }
    writeln!(output, "{}", card.text)?;
    if let Some(readings) = &card.readings {
        writeln!(output, "  [{readings}]")?;
    }
    if let Some(example) = &card.example {
        writeln!(output, "  e.g. {example}")?;
    }
    Ok(())
}

fn write_answer<O: Write>(output: &mut O, answer: &Answer) -> Result<()> {
    writeln!(output, "-> {}", answer.text)?;
    if let Some(readings) = &answer.readings {
        writeln!(output, "   [{readings}]")?;
    }
    if let Some(example) = &answer.example {
        writeln!(output, "   e.g. {example}")?;
    }
    Ok(())
}
