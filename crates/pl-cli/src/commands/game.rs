use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use pl_core::{Choice, GameAction, UserId};
use pl_game::{BotRound, ChallengeId, RoundEvent, RoundOutcome, schedule_bot_round};

use super::{find_challenge, find_user, money, name_of};
use crate::state::Session;

pub fn challenge(
    session: &mut Session,
    from: &str,
    to: &str,
    amount: Option<f64>,
    bot: bool,
) -> Result<(), String> {
    let from = find_user(session, from)?;
    let to = find_user(session, to)?;
    let now = Utc::now();

    let id = match amount {
        Some(amount) => session.table.challenge_to_game(from, to, amount, bot, now),
        None => session.table.challenge_debt(from, to, bot, now),
    }
    .map_err(|e| e.to_string())?;
    session.save()?;

    let stake = session
        .table
        .board()
        .challenge(id)
        .map(|c| c.amount)
        .unwrap_or_default();
    let opponent = if bot {
        "the bot".to_string()
    } else {
        name_of(session, to)
    };
    println!(
        "  {} {} challenged {opponent} over {} ({id})",
        "Game on!".cyan().bold(),
        name_of(session, from),
        money(stake),
    );
    Ok(())
}

pub fn accept(session: &mut Session, challenge: &str) -> Result<(), String> {
    let id = find_challenge(session, challenge)?;
    session
        .table
        .accept_challenge(id)
        .map_err(|e| e.to_string())?;
    session.save()?;
    println!("  {} challenge {id}", "Accepted".green().bold());
    Ok(())
}

pub fn choose(
    session: &mut Session,
    challenge: &str,
    player: &str,
    hand: &str,
    delay_ms: u64,
) -> Result<(), String> {
    let id = find_challenge(session, challenge)?;
    let player = find_user(session, player)?;
    let choice =
        Choice::parse(hand).ok_or_else(|| format!("'{hand}' is not rock, paper or scissors"))?;
    let is_bot = session
        .table
        .board()
        .challenge(id)
        .is_some_and(|c| c.is_bot);

    let outcome = if is_bot {
        play_against_bot(session, id, player, choice, Duration::from_millis(delay_ms))?
    } else {
        session
            .table
            .make_game_choice(id, player, choice, &mut session.rng, Utc::now())
            .map_err(|e| e.to_string())?
    };
    session.save()?;

    println!("  {} played {choice}", name_of(session, player));
    report(session, &outcome);
    Ok(())
}

/// Run a delayed bot round to completion, printing the reveal as it happens.
fn play_against_bot(
    session: &mut Session,
    id: ChallengeId,
    player: UserId,
    choice: Choice,
    delay: Duration,
) -> Result<RoundOutcome, String> {
    let round = BotRound::draw(&session.table, id, player, choice, &mut session.rng)
        .map_err(|e| e.to_string())?;
    let shared = Arc::new(Mutex::new(session.table.clone()));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| e.to_string())?;
    let result = runtime.block_on(async {
        let mut handle = schedule_bot_round(Arc::clone(&shared), round, delay);
        while let Some(event) = handle.next_event().await {
            match event {
                RoundEvent::BotRevealed(bot) => println!("  The bot played {bot}..."),
                RoundEvent::Finished(result) => return Some(result),
            }
        }
        None
    });

    let outcome = result
        .ok_or("the bot round was interrupted")?
        .map_err(|e| e.to_string())?;
    session.table = shared.lock().unwrap_or_else(PoisonError::into_inner).clone();
    Ok(outcome)
}

fn report(session: &Session, outcome: &RoundOutcome) {
    match outcome {
        RoundOutcome::Waiting => println!("  Waiting for the other player."),
        RoundOutcome::Draw { hand } => {
            println!("  {} Both played {hand}. Play again!", "Draw.".yellow().bold())
        }
        RoundOutcome::Decided {
            winner,
            action,
            settlement,
        } => {
            let verdict = match action {
                GameAction::Cancel => "debt cancelled".green().bold(),
                GameAction::Double => "debt doubled".red().bold(),
            };
            println!("  {} wins: {verdict}", name_of(session, *winner));
            let owed = session.table.book().owes(settlement.from, settlement.to);
            println!(
                "  {} now owes {} {}",
                name_of(session, settlement.from),
                name_of(session, settlement.to),
                money(owed),
            );
        }
        RoundOutcome::AlreadyCompleted => println!("  That challenge is already over."),
    }
}

pub fn resolve(session: &mut Session, challenge: &str) -> Result<(), String> {
    let id = find_challenge(session, challenge)?;
    let outcome = session
        .table
        .resolve_game(id, Utc::now())
        .map_err(|e| e.to_string())?;
    session.save()?;
    report(session, &outcome);
    Ok(())
}

pub fn list(session: &Session) -> Result<(), String> {
    let challenges = session.table.board().challenges();
    if challenges.is_empty() {
        println!("  No challenges.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Debtor", "Creditor", "Stake", "Status"]);
    for c in &challenges {
        let creditor = if c.is_bot {
            format!("{} (bot)", name_of(session, c.to_id))
        } else {
            name_of(session, c.to_id)
        };
        table.add_row(vec![
            c.id.to_string(),
            name_of(session, c.from_id),
            creditor,
            money(c.amount),
            c.status.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
