//! Interactive terminal session.

use anyhow::Result;
use quiz_core::{
    AudioPort, DisplayState, GameConfig, GameEvent, GameMachine, GameView, Phase, SessionStore,
};
use std::io::{BufRead, Write};
use std::thread;
use std::time::Duration;

/// Map one line of input to an event for the screen currently shown.
/// `None` means the input means nothing here.
pub fn parse_command(view: &GameView, input: &str) -> Option<GameEvent> {
    let input = input.trim();
    match input {
        "x" => return Some(GameEvent::ResetAll),
        "s" => return Some(GameEvent::ToggleSound),
        _ => {}
    }

    match view.phase {
        Phase::Select => {
            let player = match input.parse::<usize>() {
                Ok(n) if n >= 1 => view.players.get(n - 1),
                _ => view.players.iter().find(|p| p.id == input),
            }?;
            Some(GameEvent::SelectPlayer { player_id: player.id.clone() })
        }
        Phase::Ready => match input {
            "" | "y" => Some(GameEvent::ConfirmStart),
            _ => None,
        },
        Phase::Playing => {
            let question = view.question.as_ref()?;
            match (question.display, input) {
                (DisplayState::ShowingResult, "r") => Some(GameEvent::RetryCurrent),
                (DisplayState::ShowingResult, "" | "n") => Some(GameEvent::Advance),
                (DisplayState::ShowingResult, _) => None,
                (DisplayState::AwaitingAnswer, key) => {
                    let key = key.to_uppercase();
                    question
                        .question
                        .has_option(&key)
                        .then_some(GameEvent::ChooseAnswer { key })
                }
            }
        }
        Phase::Summary => match input {
            "" | "n" => Some(GameEvent::Restart),
            _ => None,
        },
    }
}

pub fn render(view: &GameView, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out)?;
    match view.phase {
        Phase::Select => {
            writeln!(out, "Who is playing?")?;
            for (i, player) in view.players.iter().enumerate() {
                writeln!(
                    out,
                    "  {}) {} - {} per question, +{} each round",
                    i + 1,
                    player.name,
                    view.format_amount(player.base_question_value),
                    view.format_amount(player.value_increment)
                )?;
            }
            write!(out, "Number or id> ")?;
        }
        Phase::Ready => {
            let name = view.player.as_ref().map_or("", |p| p.name.as_str());
            writeln!(out, "Ready, {}?", name)?;
            write!(out, "Press Enter to start> ")?;
        }
        Phase::Playing => {
            if let Some(q) = &view.question {
                writeln!(
                    out,
                    "Question {} of {} for {}  [{}]",
                    q.number(),
                    q.total,
                    view.format_amount(q.value),
                    q.question.subject
                )?;
                writeln!(out, "{}", q.question.text)?;
                if let Some(image) = &q.question.image_ref {
                    writeln!(out, "  (image: {})", image)?;
                }
                for (key, text) in &q.question.options {
                    let marker = match (&q.selected_answer, q.showing_result()) {
                        (Some(selected), true) if selected == key => ">",
                        _ => " ",
                    };
                    writeln!(out, " {}{}) {}", marker, key, text)?;
                }
                if q.showing_result() {
                    if q.is_correct == Some(true) {
                        writeln!(out, "Correct! +{}", view.format_amount(q.value))?;
                    } else {
                        writeln!(
                            out,
                            "Wrong. The answer was {}) {}",
                            q.question.correct_answer,
                            q.question.correct_text().unwrap_or("")
                        )?;
                    }
                    let next = if q.is_last() { "finish" } else { "next" };
                    write!(out, "[n] {}  [r] retry> ", next)?;
                } else {
                    write!(out, "Your answer> ")?;
                }
            }
        }
        Phase::Summary => {
            if let Some(score) = &view.score {
                writeln!(out, "Game over!")?;
                if let Some(message) = &score.message {
                    writeln!(out, "{}", message)?;
                }
                let percentage = score.percentage.map_or("-".to_string(), |p| format!("{}%", p));
                writeln!(
                    out,
                    "Correct: {}/{} ({})",
                    score.correct_count, score.total_answered, percentage
                )?;
                writeln!(
                    out,
                    "Won {} of a possible {}",
                    view.format_amount(score.amount_won),
                    view.format_amount(score.max_possible)
                )?;
            }
            for (i, entry) in view.review.iter().enumerate() {
                let mark = if entry.is_correct { "ok" } else { "--" };
                writeln!(
                    out,
                    "  {:>2}. [{}] {} ({})",
                    i + 1,
                    mark,
                    entry.question,
                    view.format_amount(entry.value)
                )?;
                if entry.is_correct {
                    writeln!(out, "      Your answer: {}", entry.selected_answer)?;
                } else {
                    writeln!(
                        out,
                        "      Your answer: {}  Correct: {}) {}",
                        entry.selected_answer,
                        entry.correct_answer,
                        entry.correct_text.as_deref().unwrap_or("")
                    )?;
                }
            }
            write!(out, "Press Enter to play again> ")?;
        }
    }
    out.flush()
}

/// Run the game over `input` until it ends or the player quits with `q`.
/// The session stays saved on quit.
pub fn run<S, A, R, W>(
    machine: &mut GameMachine<S, A>,
    config: &GameConfig,
    input: R,
    out: &mut W,
) -> Result<()>
where
    S: SessionStore,
    A: AudioPort,
    R: BufRead,
    W: Write,
{
    let schedule = &config.reveal_schedule;
    let mut lines = input.lines();

    loop {
        let view = machine.view();
        render(&view, out)?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if line.trim() == "q" {
            writeln!(out, "Bye! Your progress is saved.")?;
            break;
        }

        let Some(event) = parse_command(&view, &line) else {
            writeln!(out, "Not a valid choice here.")?;
            continue;
        };

        let delay = match event {
            GameEvent::ConfirmStart => schedule.start_delay_ms,
            GameEvent::ChooseAnswer { .. } => schedule.result_reveal_ms,
            _ => 0,
        };

        match machine.dispatch(&event) {
            Ok(transition) => {
                tracing::debug!(event = event.name(), ?transition, "Event applied");
                if event == GameEvent::ToggleSound {
                    let state = if machine.sound_enabled() { "on" } else { "off" };
                    writeln!(out, "Sound {}", state)?;
                }
            }
            Err(e) if e.is_rejection() => writeln!(out, "{}", e)?,
            Err(e) => return Err(e.into()),
        }

        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
    }

    Ok(())
}
