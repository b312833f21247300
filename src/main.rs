use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use colt_scheduler::client::ApiClient;
use colt_scheduler::config::{NodeConfig, SchedulerConfig};
use colt_scheduler::node::Node;
use colt_scheduler::scheduler::Job;
use colt_scheduler::shutdown::install_shutdown_handler;
use colt_scheduler::worker::Worker;

#[derive(Parser, Debug)]
#[command(name = "colt")]
#[command(version)]
#[command(about = "A job scheduler that assigns queued jobs to registered workers")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the scheduler server
    Server(ServerArgs),

    /// Job management commands
    Job {
        #[command(flatten)]
        client: ClientArgs,

        #[command(subcommand)]
        command: JobCommands,
    },

    /// Worker management commands
    Worker {
        #[command(flatten)]
        client: ClientArgs,

        #[command(subcommand)]
        command: WorkerCommands,
    },
}

// =============================================================================
// Server Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct ServerArgs {
    /// Address to bind the HTTP API to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Simulated execution time per job, in milliseconds
    #[arg(long, default_value = "5000")]
    execution_ms: u64,

    /// Initial wait before retrying a job no worker could take, in milliseconds
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u64).range(1..))]
    retry_backoff_min_ms: u64,

    /// Longest wait between retries, in milliseconds
    #[arg(long, default_value = "5000")]
    retry_backoff_max_ms: u64,

    /// Mark workers offline after this long without a heartbeat (disabled if unset)
    #[arg(long)]
    worker_timeout_ms: Option<u64>,

    /// How often to check worker heartbeats, in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    liveness_check_ms: u64,
}

// =============================================================================
// Client Arguments (shared by job and worker commands)
// =============================================================================

#[derive(Parser, Debug)]
struct ClientArgs {
    /// Server address
    #[arg(long, short = 'a', default_value = "http://127.0.0.1:8080")]
    addr: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// =============================================================================
// Job Commands
// =============================================================================

#[derive(clap::Subcommand, Debug)]
enum JobCommands {
    /// Submit a new job
    Submit {
        /// Human-readable job name
        #[arg(long)]
        name: String,

        /// Command to execute
        #[arg(long)]
        command: String,

        /// Argument for the command (repeat for several)
        #[arg(long = "arg")]
        args: Vec<String>,
    },
    /// Get status of a specific job
    Status {
        /// The job ID
        job_id: String,
    },
    /// List all jobs
    List,
}

// =============================================================================
// Worker Commands
// =============================================================================

#[derive(clap::Subcommand, Debug)]
enum WorkerCommands {
    /// Register a new worker
    Register {
        /// Human-readable worker name
        #[arg(long)]
        name: String,

        /// CPU cores the worker offers
        #[arg(long)]
        cpu_cores: u32,

        /// Memory the worker offers, in MB
        #[arg(long)]
        memory_mb: u64,
    },
    /// List workers currently accepting jobs
    List,
    /// Send a heartbeat on behalf of a worker
    Heartbeat {
        /// The worker ID
        worker_id: String,
    },
}

#[derive(Serialize)]
struct JobListOutput<'a> {
    jobs: &'a [Job],
    total_count: usize,
}

#[derive(Serialize)]
struct WorkerListOutput<'a> {
    workers: &'a [Worker],
    total_count: usize,
}

// =============================================================================
// Server Implementation
// =============================================================================

async fn run_server(args: ServerArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let listen_addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let config = NodeConfig {
        listen_addr,
        scheduler: SchedulerConfig {
            execution_duration_ms: args.execution_ms,
            retry_backoff_min_ms: args.retry_backoff_min_ms,
            retry_backoff_max_ms: args.retry_backoff_max_ms,
            worker_timeout_ms: args.worker_timeout_ms,
            liveness_check_interval_ms: args.liveness_check_ms,
        },
    };

    tracing::info!(
        listen_addr = %config.listen_addr,
        execution_ms = config.scheduler.execution_duration_ms,
        worker_timeout_ms = ?config.scheduler.worker_timeout_ms,
        "Starting colt scheduler"
    );

    let shutdown = install_shutdown_handler();
    let node = Arc::new(Node::new(config));
    node.run(shutdown).await?;

    tracing::info!("Scheduler shut down");
    Ok(())
}

// =============================================================================
// Client Command Handlers
// =============================================================================

fn print_job(job: &Job) {
    println!("Job ID:          {}", job.id);
    println!("Name:            {}", job.name);
    println!("Command:         {} {}", job.command, job.args.join(" "));
    println!("Status:          {}", job.status);
    println!("Submitted:       {}", job.submit_time.to_rfc3339());
    if let Some(worker) = &job.assigned_worker {
        println!("Assigned Worker: {}", worker);
    }
    if let Some(completed_at) = job.completed_at {
        println!("Completed:       {}", completed_at.to_rfc3339());
    }
    if let Some(error) = &job.error {
        println!("Error:");
        for line in error.lines() {
            println!("  {}", line);
        }
    }
}

async fn handle_job_command(
    client: &ApiClient,
    command: JobCommands,
    output_format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        JobCommands::Submit {
            name,
            command,
            args,
        } => {
            let resp = client.submit_job(name, command, args).await?;
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resp)?),
                OutputFormat::Table => {
                    println!("Job submitted successfully!");
                    println!("Job ID: {}", resp.job_id);
                    println!("Status: {}", resp.status);
                }
            }
        }
        JobCommands::Status { job_id } => {
            let job = client.get_job(&job_id).await?;
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&job)?),
                OutputFormat::Table => print_job(&job),
            }
        }
        JobCommands::List => {
            let jobs = client.list_jobs().await?;
            match output_format {
                OutputFormat::Json => {
                    let output = JobListOutput {
                        jobs: &jobs,
                        total_count: jobs.len(),
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Table => {
                    if jobs.is_empty() {
                        println!("No jobs found.");
                        return Ok(());
                    }
                    println!("{:<38} {:<20} {:<10} COMMAND", "JOB ID", "NAME", "STATUS");
                    println!("{}", "-".repeat(90));
                    for job in &jobs {
                        let cmd_display = if job.command.chars().count() > 20 {
                            format!("{}...", job.command.chars().take(17).collect::<String>())
                        } else {
                            job.command.clone()
                        };
                        println!(
                            "{:<38} {:<20} {:<10} {}",
                            job.id, job.name, job.status, cmd_display
                        );
                    }
                    println!();
                    println!("{} jobs", jobs.len());
                }
            }
        }
    }
    Ok(())
}

async fn handle_worker_command(
    client: &ApiClient,
    command: WorkerCommands,
    output_format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        WorkerCommands::Register {
            name,
            cpu_cores,
            memory_mb,
        } => {
            let resp = client.register_worker(name, cpu_cores, memory_mb).await?;
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resp)?),
                OutputFormat::Table => {
                    println!("Worker registered successfully!");
                    println!("Worker ID: {}", resp.worker_id);
                    println!("Status:    {}", resp.status);
                }
            }
        }
        WorkerCommands::List => {
            let workers = client.list_workers().await?;
            match output_format {
                OutputFormat::Json => {
                    let output = WorkerListOutput {
                        workers: &workers,
                        total_count: workers.len(),
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Table => {
                    if workers.is_empty() {
                        println!("No active workers.");
                        return Ok(());
                    }
                    println!(
                        "{:<38} {:<20} {:<8} {:<6} {:<10}",
                        "WORKER ID", "NAME", "STATUS", "CPU", "MEMORY MB"
                    );
                    println!("{}", "-".repeat(86));
                    for worker in &workers {
                        println!(
                            "{:<38} {:<20} {:<8} {:<6} {:<10}",
                            worker.id,
                            worker.name,
                            worker.status,
                            worker.resources.cpu_cores,
                            worker.resources.memory_mb
                        );
                    }
                }
            }
        }
        WorkerCommands::Heartbeat { worker_id } => {
            let worker = client.heartbeat(&worker_id).await?;
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&worker)?),
                OutputFormat::Table => {
                    println!("Heartbeat recorded for {}", worker.id);
                    println!("Status: {}", worker.status);
                }
            }
        }
    }
    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Commands::Server(server_args) => {
            run_server(server_args).await?;
        }
        Commands::Job { client, command } => {
            let api = ApiClient::new(&client.addr);
            handle_job_command(&api, command, &client.output).await?;
        }
        Commands::Worker { client, command } => {
            let api = ApiClient::new(&client.addr);
            handle_worker_command(&api, command, &client.output).await?;
        }
    }

    Ok(())
}
