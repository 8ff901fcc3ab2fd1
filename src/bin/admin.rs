// LabFlow - admin companion CLI
// Drives the REST API of a running server as an administrative identity.
// Run with: cargo run --bin admin -- <command>

use clap::{Parser, Subcommand};
use colored::Colorize;
use reqwest::Client;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "labflow-admin", about = "Operator CLI for a running LabFlow server")]
struct Cli {
    /// Base URL of the LabFlow server
    #[arg(long, default_value = "http://localhost:3000", env = "LABFLOW_URL")]
    server: String,

    /// Identity to act as; must hold an administrative role on the server
    #[arg(long, default_value = "admin", env = "LABFLOW_ADMIN_ID")]
    admin_id: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed a demo lab: one supervisor and two students
    Seed,
    /// Create a user record
    AddUser {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// student | supervisor | lab_manager | admin
        #[arg(long)]
        role: String,
        /// Supervisor id, for students
        #[arg(long)]
        supervisor: Option<String>,
    },
    /// List user records
    Users,
    /// List research logs (admin view)
    Logs,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    match &cli.command {
        Command::Seed => seed(&cli, &client).await,
        Command::AddUser {
            name,
            email,
            role,
            supervisor,
        } => {
            let user = create_user(
                &cli,
                &client,
                json!({
                    "name": name,
                    "email": email,
                    "role": role,
                    "supervisor_id": supervisor,
                }),
            )
            .await?;
            print_user(&user);
            Ok(())
        }
        Command::Users => list_users(&cli, &client).await,
        Command::Logs => list_logs(&cli, &client).await,
    }
}

async fn seed(cli: &Cli, client: &Client) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "Seeding demo lab...".bold());

    let supervisor = create_user(
        cli,
        client,
        json!({
            "name": "Dr. Ortega",
            "email": "ortega@lab.example",
            "role": "supervisor",
        }),
    )
    .await?;
    print_user(&supervisor);

    let supervisor_id = supervisor["id"].as_str().unwrap_or_default().to_string();
    for (name, email) in [
        ("Mina Park", "mina@lab.example"),
        ("Jonas Weber", "jonas@lab.example"),
    ] {
        let student = create_user(
            cli,
            client,
            json!({
                "name": name,
                "email": email,
                "role": "student",
                "supervisor_id": supervisor_id,
            }),
        )
        .await?;
        print_user(&student);
    }

    println!("{}", "Done.".green().bold());
    Ok(())
}

async fn create_user(
    cli: &Cli,
    client: &Client,
    body: Value,
) -> Result<Value, Box<dyn std::error::Error>> {
    let response = client
        .post(format!("{}/users", cli.server))
        .header("x-user-id", &cli.admin_id)
        .header("x-user-role", "admin")
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let detail = response.text().await.unwrap_or_default();
        return Err(format!("server rejected user creation ({status}): {detail}").into());
    }
    Ok(response.json().await?)
}

async fn list_users(cli: &Cli, client: &Client) -> Result<(), Box<dyn std::error::Error>> {
    let body: Value = client
        .get(format!("{}/users", cli.server))
        .header("x-user-id", &cli.admin_id)
        .header("x-user-role", "admin")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let users = body["users"].as_array().cloned().unwrap_or_default();
    println!("{} user(s)", users.len());
    for user in &users {
        print_user(user);
    }
    Ok(())
}

async fn list_logs(cli: &Cli, client: &Client) -> Result<(), Box<dyn std::error::Error>> {
    let body: Value = client
        .get(format!("{}/research-logs", cli.server))
        .header("x-user-id", &cli.admin_id)
        .header("x-user-role", "admin")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let logs = body["logs"].as_array().cloned().unwrap_or_default();
    println!("{} research log(s)", logs.len());
    for log in &logs {
        let status = log["status"].as_str().unwrap_or("?");
        let colored_status = match status {
            "SUBMITTED" => status.yellow(),
            "ACCEPTED" => status.green(),
            "DECLINED" => status.red(),
            "RETURNED" => status.cyan(),
            _ => status.normal(),
        };
        println!(
            "  [{}] {} {} {}",
            colored_status,
            log["id"].as_str().unwrap_or("?").dimmed(),
            log["title"].as_str().unwrap_or("").bold(),
            log["student_name"]
                .as_str()
                .map(|n| format!("by {n}"))
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn print_user(user: &Value) {
    println!(
        "  {} {} <{}> {}",
        user["role"].as_str().unwrap_or("?").blue(),
        user["name"].as_str().unwrap_or("?").bold(),
        user["email"].as_str().unwrap_or("?"),
        user["id"].as_str().unwrap_or("?").dimmed()
    );
}
