//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open a roster database (file or in-memory) and run a short scenario
//!   through the core service to verify `roster_core` wiring end to end.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `roster_cli [--db <path>] [--log-dir <absolute dir>] [--log-level <level>]`

use roster_core::db::{open_db, open_db_in_memory, unit_of_work};
use roster_core::{
    core_version, default_log_level, init_logging, Direction, MemberProperty, MemberRepository,
    MemberService, PageRequest, RepoError, SqliteMemberRepository, SqliteTeamRepository,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Default)]
struct CliArgs {
    db: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    log_level: Option<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(flag) = args.next() {
        let mut value = || {
            args.next()
                .ok_or_else(|| format!("missing value for `{flag}`"))
        };
        match flag.as_str() {
            "--db" => parsed.db = Some(PathBuf::from(value()?)),
            "--log-dir" => parsed.log_dir = Some(PathBuf::from(value()?)),
            "--log-level" => parsed.log_level = Some(value()?),
            other => return Err(format!("unknown argument `{other}`")),
        }
    }
    Ok(parsed)
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = args.log_dir.as_ref() {
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let mut conn = match args.db.as_ref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    println!("roster_core version={}", core_version());

    unit_of_work(&mut conn, |tx| -> Result<(), RepoError> {
        let service = MemberService::new(
            SqliteMemberRepository::try_new(tx)?,
            SqliteTeamRepository::try_new(tx)?,
        );

        let team_a = service.create_team("teamA")?;
        let team_b = service.create_team("teamB")?;
        for i in 1..=5 {
            let team = if i % 2 == 0 { &team_b } else { &team_a };
            service.join(format!("member{i}"), 10 * i, team)?;
        }

        let request = PageRequest::of_sorted(0, 3, Direction::Desc, MemberProperty::Username)
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        let page = service.member_page_as_dto(30, &request)?;
        println!(
            "[page] total_elements={} total_pages={}",
            page.total_elements(),
            page.total_pages()
        );
        for dto in &page {
            println!("[page] {dto}");
        }

        let affected = service.birthday_for_members_aged_at_least(30)?;
        println!("[bulk] affected={affected}");

        for member in service.members().find_member_fetch_join()? {
            let team = member.team().map(|t| t.name.as_str()).unwrap_or("-");
            println!("[fetch] {member} team={team}");
        }
        Ok(())
    })?;

    Ok(())
}
