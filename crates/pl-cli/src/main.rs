//! CLI frontend for Potluck: shared expenses, debt games, and the wheel of fate.

mod commands;
mod state;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use state::Session;

#[derive(Parser)]
#[command(
    name = "potluck",
    about = "Potluck: split expenses, gamble small debts, spin the wheel of fate",
    version,
    propagate_version = true
)]
struct Cli {
    /// State file
    #[arg(long, global = true, default_value = "potluck.json")]
    state: PathBuf,

    /// RNG seed for deterministic games and spins
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Record and list expenses
    Expense {
        #[command(subcommand)]
        action: ExpenseCommand,
    },

    /// Record a payment from a debtor to a creditor
    Settle {
        /// Who pays
        from: String,
        /// Who is paid
        to: String,
        /// How much
        amount: f64,
    },

    /// Show who owes whom
    Balances {
        /// Only count this group's expenses
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Apply karma penalties for overdue debts
    Sweep,

    /// Manage groups
    Group {
        #[command(subcommand)]
        action: GroupCommand,
    },

    /// Gamble a small debt on rock-paper-scissors
    Game {
        #[command(subcommand)]
        action: GameCommand,
    },

    /// Plan events
    Event {
        #[command(subcommand)]
        action: EventCommand,
    },

    /// Spin the wheel of fate
    Wheel {
        #[command(subcommand)]
        action: WheelCommand,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Add a user
    Add {
        /// Display name
        name: String,
    },
    /// List users with karma and streaks
    List,
}

#[derive(Subcommand)]
enum ExpenseCommand {
    /// Record an expense split evenly between participants
    Add {
        /// What it was for
        description: String,
        /// Total amount
        amount: f64,
        /// Who paid
        #[arg(short, long)]
        paid_by: String,
        /// Who shares it (default: the group's members, or everyone)
        #[arg(short, long = "split")]
        split: Vec<String>,
        /// Group the expense belongs to
        #[arg(short, long)]
        group: Option<String>,
        /// Category, e.g. Food
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List expenses
    List {
        /// Only this group's expenses
        #[arg(short, long)]
        group: Option<String>,
    },
}

#[derive(Subcommand)]
enum GroupCommand {
    /// Create a group
    Create {
        /// Group name
        name: String,
        /// Who creates it (also a member)
        #[arg(short, long)]
        by: String,
        /// Additional members
        #[arg(short, long = "member")]
        members: Vec<String>,
    },
    /// Add a user to a group
    Add {
        /// Group name
        group: String,
        /// User to add
        user: String,
    },
    /// Remove a user from a group
    Remove {
        /// Group name
        group: String,
        /// User to remove
        user: String,
    },
    /// Balances over the group's expenses
    Balances {
        /// Group name
        group: String,
    },
    /// Where the group's money went
    Summary {
        /// Group name
        group: String,
    },
}

#[derive(Subcommand)]
enum GameCommand {
    /// Challenge a creditor to a game over a debt
    Challenge {
        /// The debtor
        from: String,
        /// The creditor
        to: String,
        /// Stake (default: the current debt)
        #[arg(short, long)]
        amount: Option<f64>,
        /// Play against the bot instead of the creditor
        #[arg(long)]
        bot: bool,
    },
    /// Accept a pending challenge
    Accept {
        /// Challenge id prefix
        challenge: String,
    },
    /// Play a hand
    Choose {
        /// Challenge id prefix
        challenge: String,
        /// Who is playing
        player: String,
        /// rock, paper or scissors
        hand: String,
        /// Pause before each bot reveal, in milliseconds
        #[arg(long, default_value = "1000")]
        delay_ms: u64,
    },
    /// Resolve a challenge whose hands are both in
    Resolve {
        /// Challenge id prefix
        challenge: String,
    },
    /// List challenges
    List,
}

#[derive(Subcommand)]
enum EventCommand {
    /// Create an event
    Create {
        /// Title
        title: String,
        /// Organiser
        #[arg(short, long)]
        by: String,
        /// Free text
        #[arg(short, long, default_value = "")]
        description: String,
        /// Where
        #[arg(short, long, default_value = "")]
        location: String,
        /// When
        #[arg(long, default_value = "")]
        date: String,
        /// Something to bring
        #[arg(short, long = "item")]
        items: Vec<String>,
    },
    /// Answer an invitation
    Respond {
        /// Event title or id prefix
        event: String,
        /// Who answers
        user: String,
        /// going or not-going
        response: String,
    },
    /// List events
    List,
}

#[derive(Subcommand)]
enum WheelCommand {
    /// Pick who brings an item
    Spin {
        /// Event title or id prefix
        event: String,
        /// Item name
        item: String,
        /// Give everyone an equal slice
        #[arg(long)]
        fair: bool,
        /// Custom weight, as user=weight
        #[arg(short, long = "weight")]
        weights: Vec<String>,
    },
    /// Show past spins for an event
    History {
        /// Event title or id prefix
        event: String,
    },
    /// Forget past spins for an event
    Clear {
        /// Event title or id prefix
        event: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("POTLUCK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let mut session = Session::open(&cli.state, cli.seed)?;
    let s = &mut session;

    match cli.command {
        Commands::User { action } => match action {
            UserCommand::Add { name } => commands::user::add(s, &name),
            UserCommand::List => commands::user::list(s),
        },
        Commands::Expense { action } => match action {
            ExpenseCommand::Add {
                description,
                amount,
                paid_by,
                split,
                group,
                category,
            } => commands::expense::add(
                s,
                &description,
                amount,
                &paid_by,
                &split,
                group.as_deref(),
                category.as_deref(),
            ),
            ExpenseCommand::List { group } => commands::expense::list(s, group.as_deref()),
        },
        Commands::Settle { from, to, amount } => commands::ledger::settle(s, &from, &to, amount),
        Commands::Balances { group } => commands::ledger::balances(s, group.as_deref()),
        Commands::Sweep => commands::ledger::sweep(s),
        Commands::Group { action } => match action {
            GroupCommand::Create { name, by, members } => {
                commands::group::create(s, &name, &by, &members)
            }
            GroupCommand::Add { group, user } => commands::group::add(s, &group, &user),
            GroupCommand::Remove { group, user } => commands::group::remove(s, &group, &user),
            GroupCommand::Balances { group } => commands::ledger::balances(s, Some(&group)),
            GroupCommand::Summary { group } => commands::group::summary(s, &group),
        },
        Commands::Game { action } => match action {
            GameCommand::Challenge {
                from,
                to,
                amount,
                bot,
            } => commands::game::challenge(s, &from, &to, amount, bot),
            GameCommand::Accept { challenge } => commands::game::accept(s, &challenge),
            GameCommand::Choose {
                challenge,
                player,
                hand,
                delay_ms,
            } => commands::game::choose(s, &challenge, &player, &hand, delay_ms),
            GameCommand::Resolve { challenge } => commands::game::resolve(s, &challenge),
            GameCommand::List => commands::game::list(s),
        },
        Commands::Event { action } => match action {
            EventCommand::Create {
                title,
                by,
                description,
                location,
                date,
                items,
            } => commands::event::create(s, &title, &by, &description, &location, &date, items),
            EventCommand::Respond {
                event,
                user,
                response,
            } => commands::event::respond(s, &event, &user, &response),
            EventCommand::List => commands::event::list(s),
        },
        Commands::Wheel { action } => match action {
            WheelCommand::Spin {
                event,
                item,
                fair,
                weights,
            } => commands::wheel::spin(s, &event, &item, fair, &weights),
            WheelCommand::History { event } => commands::wheel::history(s, &event),
            WheelCommand::Clear { event } => commands::wheel::clear(s, &event),
        },
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
