//! deposit-dapp terminal front end.
//!
//! Loads configuration from the environment (and `.env`), restores a saved
//! wallet session if there is one, and renders the page after every command.
//! Actions run in the background so the prompt stays usable while a
//! transaction confirms.

#![warn(clippy::all, clippy::pedantic)]

use std::sync::Arc;

use deposit_dapp::common::logging::{self, LogLevel};
use deposit_dapp::{ActionKind, DappConfig, DappError, DepositDapp, Resolution};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

const HELP: &str = "\
Commands:
  connect                      connect the wallet
  disconnect                   disconnect the wallet
  deposit [amount]             deposit ETH into the contract
  withdraw [amount]            withdraw ETH from the contract
  owner-withdraw               withdraw all funds (contract owner only)
  amount deposit|withdraw <v>  edit an amount field
  refresh                      re-read balances
  status                       show the page
  help                         show this help
  quit                         exit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Connect,
    Disconnect,
    Action(ActionKind, Option<String>),
    Amount(ActionKind, String),
    Refresh,
    Status,
    Help,
    Quit,
    Empty,
}

impl Command {
    fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Self::Empty);
        };
        let arg = words.next().map(str::to_string);

        let command = match head.to_ascii_lowercase().as_str() {
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            "deposit" => Self::Action(ActionKind::Deposit, arg),
            "withdraw" => Self::Action(ActionKind::Withdraw, arg),
            "owner-withdraw" | "ownerwithdraw" => Self::Action(ActionKind::OwnerWithdraw, None),
            "amount" => {
                let kind = match arg.as_deref() {
                    Some("deposit") => ActionKind::Deposit,
                    Some("withdraw") => ActionKind::Withdraw,
                    _ => return Err("usage: amount deposit|withdraw <value>".to_string()),
                };
                Self::Amount(kind, words.next().unwrap_or_default().to_string())
            }
            "refresh" => Self::Refresh,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command `{other}` (try `help`)")),
        };
        Ok(command)
    }
}

type ActionResult = (ActionKind, Result<Resolution, DappError>);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = DappConfig::from_env()?;

    logging::log_section("ETH Deposit Contract");
    logging::log(LogLevel::Info, &format!("RPC URL: {}", config.rpc_url));
    logging::log(
        LogLevel::Info,
        &format!("Contract: {} (chain {})", config.contract_address, config.chain_id),
    );

    let dapp = Arc::new(DepositDapp::from_config(config)?);
    let shutdown = dapp.cancellation_token();

    match dapp.restore_session().await {
        Ok(Some(address)) => logging::log(LogLevel::Success, &format!("Restored session for {address}")),
        Ok(None) => {}
        Err(e) => logging::log(LogLevel::Warning, &format!("Session restore failed: {e}")),
    }

    println!("{HELP}\n");
    render(&dapp);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut actions: JoinSet<ActionResult> = JoinSet::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                logging::log(LogLevel::Info, "Shutting down...");
                break;
            }
            Some(joined) = actions.join_next() => {
                match joined {
                    Ok((kind, Ok(resolution))) if resolution.is_success() => {
                        logging::log(LogLevel::Success, &format!("{kind} finished"));
                    }
                    Ok((kind, Ok(_))) => logging::log(LogLevel::Error, &format!("{kind} failed")),
                    Ok((kind, Err(e))) => logging::log(LogLevel::Error, &format!("{kind}: {e}")),
                    Err(e) => logging::log(LogLevel::Error, &format!("action task failed: {e}")),
                }
                render(&dapp);
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Empty) => {}
                    Ok(command) => {
                        if let Err(e) = run(command, &dapp, &mut actions).await {
                            logging::log(LogLevel::Error, &e.to_string());
                        }
                        render(&dapp);
                    }
                    Err(message) => eprintln!("{message}"),
                }
            }
        }
    }

    shutdown.cancel();
    while actions.join_next().await.is_some() {}
    Ok(())
}

async fn run(
    command: Command,
    dapp: &Arc<DepositDapp>,
    actions: &mut JoinSet<ActionResult>,
) -> Result<(), DappError> {
    match command {
        Command::Connect => {
            dapp.connect().await?;
        }
        Command::Disconnect => dapp.disconnect().await?,
        Command::Amount(kind, value) => set_amount(dapp, kind, value)?,
        Command::Action(kind, amount) => {
            dapp.stage(kind, amount)?;
            let dapp = Arc::clone(dapp);
            actions.spawn(async move { (kind, dapp.execute(kind).await) });
        }
        Command::Refresh => {
            dapp.refresh_balances().await?;
        }
        Command::Help => println!("{HELP}"),
        Command::Status | Command::Quit | Command::Empty => {}
    }
    Ok(())
}

fn set_amount(dapp: &DepositDapp, kind: ActionKind, value: String) -> Result<(), DappError> {
    match kind {
        ActionKind::Deposit => dapp.set_deposit_amount(value),
        ActionKind::Withdraw => dapp.set_withdraw_amount(value),
        ActionKind::OwnerWithdraw => Ok(()),
    }
}

fn render(dapp: &DepositDapp) {
    match dapp.view() {
        Ok(view) => println!("\n{view}"),
        Err(e) => logging::log(LogLevel::Error, &format!("Cannot render page: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  ").unwrap(), Command::Empty);
        assert_eq!(Command::parse("connect").unwrap(), Command::Connect);
        assert_eq!(
            Command::parse("deposit 0.05").unwrap(),
            Command::Action(ActionKind::Deposit, Some("0.05".to_string()))
        );
        assert_eq!(
            Command::parse("withdraw").unwrap(),
            Command::Action(ActionKind::Withdraw, None)
        );
        assert_eq!(
            Command::parse("owner-withdraw 5").unwrap(),
            Command::Action(ActionKind::OwnerWithdraw, None)
        );
        assert_eq!(
            Command::parse("amount withdraw 0.02").unwrap(),
            Command::Amount(ActionKind::Withdraw, "0.02".to_string())
        );
        assert_eq!(Command::parse("EXIT").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("amount owner 1").is_err());
        assert!(Command::parse("selfdestruct").is_err());
    }
}
