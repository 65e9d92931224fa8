use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::content::{CommandExecutor, FsContentStore};
use crate::ledger::{
    ComputeExecutor, ContentStore, Ledger, LedgerConfig, Transaction, DEFAULT_DIFFICULTY,
};

#[derive(Parser)]
#[command(
    name = "compute-ledger",
    about = "Append-only ledger of commitments to off-chain computations"
)]
pub struct Cli {
    /// Data directory holding the chain database and content store
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Proof-of-work difficulty in bits
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
    pub difficulty: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Commit an algorithm/input pair and mine it into the next block
    CreateTx {
        /// Path to the algorithm executable
        #[arg(long)]
        algorithm: PathBuf,

        /// Path to the input data file
        #[arg(long)]
        input: PathBuf,
    },

    /// Print the chain from tip to genesis
    Print,

    /// Print the height of the chain tip
    Height,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = LedgerConfig::new(cli.data_dir.join("blocks"));
    config.difficulty = cli.difficulty;
    let ledger = Ledger::open(&config).context("failed to open ledger")?;

    match cli.command {
        Command::CreateTx { algorithm, input } => {
            let store = FsContentStore::open(cli.data_dir.join("content"))?;
            let executor = CommandExecutor::new(&store, cli.data_dir.join("tmp"))?;

            let (algorithm_ref, algorithm_hash) = store
                .upload(&algorithm)
                .with_context(|| format!("failed to store {}", algorithm.display()))?;
            let (input_ref, input_hash) = store
                .upload(&input)
                .with_context(|| format!("failed to store {}", input.display()))?;
            let output_hash = executor
                .execute(&algorithm_ref, &input_ref)
                .context("failed to execute algorithm")?;

            let tx = Transaction::new(
                algorithm_ref,
                algorithm_hash,
                input_ref,
                input_hash,
                output_hash,
            );
            let block = ledger.mine_block(vec![tx], &executor)?;

            println!(
                "Transaction committed in block {} at height {}",
                block.hash, block.height
            );
        }

        Command::Print => {
            for block in ledger.parser()? {
                let block = block?;

                println!("Height: {}", block.height);
                println!("Previous hash: {}", block.prev_hash);
                println!("Hash: {}", block.hash);
                for tx in &block.transactions {
                    println!(
                        "  tx {}: algorithm {} input {} output {}",
                        tx.id, tx.algorithm_hash, tx.input_hash, tx.output_hash
                    );
                }
                println!("PoW: {}", ledger.audit_block(&block));
                println!();
            }
        }

        Command::Height => {
            println!("{}", ledger.best_height()?);
        }
    }

    Ok(())
}
