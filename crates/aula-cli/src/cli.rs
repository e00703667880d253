//! Argument parsing and command dispatch.

use std::path::PathBuf;

use aula_api_models::UserRole;
use aula_client::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, RefreshPolicy};
use aula_telemetry::{LogFormat, LoggingConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Instrument;
use url::Url;

use crate::client::{AppContext, CliResult, parse_url};
use crate::commands::{auth, courses, exams, outcomes, users};

/// Log filter used when `RUST_LOG` is unset; the CLI stays quiet by default.
const CLI_LOG_LEVEL: &str = "warn";

/// Parses CLI arguments, executes the requested command and reports failures.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: CLI_LOG_LEVEL,
        format: cli.log_format.unwrap_or(LogFormat::Pretty),
        build_sha: env!("CARGO_PKG_VERSION"),
    };
    if let Err(err) = aula_telemetry::init_logging(&logging) {
        eprintln!("warning: {err}");
    }

    let span = aula_telemetry::command_span(command_label(&cli.command));
    match dispatch(cli).instrument(span).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let ctx = AppContext::from_cli(&cli)?;
    let format = cli.output;

    match cli.command {
        Command::Login(args) => auth::handle_login(&ctx, args, format).await,
        Command::Logout => auth::handle_logout(&ctx),
        Command::Whoami => auth::handle_whoami(&ctx, format).await,
        Command::Status => auth::handle_status(&ctx, format).await,
        Command::Passwd(args) => auth::handle_passwd(&ctx, args).await,
        Command::Profile(ProfileCommand::Update(args)) => {
            auth::handle_profile_update(&ctx, args, format).await
        }
        Command::Cursos(command) => courses::handle_cursos(&ctx, command, format).await,
        Command::Promociones(command) => courses::handle_promociones(&ctx, command, format).await,
        Command::Temas(command) => courses::handle_temas(&ctx, command, format).await,
        Command::Materiales(command) => courses::handle_materiales(&ctx, command, format).await,
        Command::Inscripciones(command) => {
            courses::handle_inscripciones(&ctx, command, format).await
        }
        Command::Examenes(command) => exams::handle_examenes(&ctx, command, format).await,
        Command::Recuperaciones(command) => {
            exams::handle_recuperaciones(&ctx, command, format).await
        }
        Command::Calificaciones(command) => {
            exams::handle_calificaciones(&ctx, command, format).await
        }
        Command::Promedios(command) => outcomes::handle_promedios(&ctx, command, format).await,
        Command::Diplomas(command) => outcomes::handle_diplomas(&ctx, command, format).await,
        Command::Usuarios(command) => users::handle_usuarios(&ctx, command, format).await,
    }
}

pub(crate) const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Login(_) => "login",
        Command::Logout => "logout",
        Command::Whoami => "whoami",
        Command::Status => "status",
        Command::Passwd(_) => "passwd",
        Command::Profile(_) => "profile_update",
        Command::Cursos(_) => "cursos",
        Command::Promociones(_) => "promociones",
        Command::Temas(_) => "temas",
        Command::Materiales(_) => "materiales",
        Command::Inscripciones(_) => "inscripciones",
        Command::Examenes(_) => "examenes",
        Command::Recuperaciones(_) => "recuperaciones",
        Command::Calificaciones(_) => "calificaciones",
        Command::Promedios(_) => "promedios",
        Command::Diplomas(_) => "diplomas",
        Command::Usuarios(_) => "usuarios",
    }
}

#[derive(Parser)]
#[command(name = "aula", about = "Command-line client for the Aula course platform")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "AULA_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "AULA_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long,
        global = true,
        env = "AULA_REFRESH_POLICY",
        value_parser = parse_refresh_policy,
        default_value = "per-request"
    )]
    pub(crate) refresh_policy: RefreshPolicy,
    #[arg(
        long,
        global = true,
        env = "AULA_SESSION_FILE",
        help = "Session file (defaults to ~/.aula/session.json)"
    )]
    pub(crate) session_file: Option<PathBuf>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(long, global = true, env = "AULA_LOG_FORMAT", value_parser = parse_log_format)]
    pub(crate) log_format: Option<LogFormat>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Log in and store the session.
    Login(LoginArgs),
    /// Forget the stored session.
    Logout,
    /// Show the profile of the logged-in user.
    Whoami,
    /// Show the session state without contacting the server.
    Status,
    /// Change the account password.
    Passwd(PasswdArgs),
    /// Manage the own profile.
    #[command(subcommand)]
    Profile(ProfileCommand),
    #[command(subcommand)]
    Cursos(CursosCommand),
    #[command(subcommand)]
    Promociones(PromocionesCommand),
    #[command(subcommand)]
    Temas(TemasCommand),
    #[command(subcommand)]
    Materiales(MaterialesCommand),
    #[command(subcommand)]
    Inscripciones(InscripcionesCommand),
    #[command(subcommand)]
    Examenes(ExamenesCommand),
    #[command(subcommand)]
    Recuperaciones(RecuperacionesCommand),
    #[command(subcommand)]
    Calificaciones(CalificacionesCommand),
    #[command(subcommand)]
    Promedios(PromediosCommand),
    #[command(subcommand)]
    Diplomas(DiplomasCommand),
    #[command(subcommand)]
    Usuarios(UsuariosCommand),
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    pub(crate) username: String,
    #[arg(long, env = "AULA_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
}

#[derive(Args, Default)]
pub(crate) struct PasswdArgs {
    #[arg(long)]
    pub(crate) current: Option<String>,
    #[arg(long = "new")]
    pub(crate) new_password: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum ProfileCommand {
    Update(ProfileUpdateArgs),
}

#[derive(Args, Default)]
pub(crate) struct ProfileUpdateArgs {
    #[arg(long)]
    pub(crate) email: Option<String>,
    #[arg(long)]
    pub(crate) first_name: Option<String>,
    #[arg(long)]
    pub(crate) last_name: Option<String>,
    #[arg(long, help = "Phone number; pass an empty string to clear it")]
    pub(crate) telefono: Option<String>,
    #[arg(long, help = "Birth date (YYYY-MM-DD); pass an empty string to clear it")]
    pub(crate) fecha_nacimiento: Option<String>,
    #[arg(long, help = "Postal address; pass an empty string to clear it")]
    pub(crate) direccion: Option<String>,
}

#[derive(Args)]
pub(crate) struct IdArgs {
    pub(crate) id: i64,
}

#[derive(Subcommand)]
pub(crate) enum CursosCommand {
    Ls,
    Show(IdArgs),
    Create(CursoCreateArgs),
    Delete(IdArgs),
}

#[derive(Args)]
pub(crate) struct CursoCreateArgs {
    pub(crate) nombre: String,
    #[arg(long)]
    pub(crate) descripcion: Option<String>,
    #[arg(long)]
    pub(crate) inactive: bool,
}

#[derive(Subcommand)]
pub(crate) enum PromocionesCommand {
    Ls(PromocionesListArgs),
    Show(IdArgs),
}

#[derive(Args, Default)]
pub(crate) struct PromocionesListArgs {
    #[arg(long)]
    pub(crate) curso: Option<i64>,
}

#[derive(Subcommand)]
pub(crate) enum TemasCommand {
    Ls(ByPromocionArgs),
}

#[derive(Args, Default)]
pub(crate) struct ByPromocionArgs {
    #[arg(long)]
    pub(crate) promocion: Option<i64>,
}

#[derive(Subcommand)]
pub(crate) enum MaterialesCommand {
    Ls(ByTemaArgs),
    Upload(MaterialUploadArgs),
    Download(MaterialDownloadArgs),
}

#[derive(Args, Default)]
pub(crate) struct ByTemaArgs {
    #[arg(long)]
    pub(crate) tema: Option<i64>,
}

#[derive(Args)]
pub(crate) struct MaterialUploadArgs {
    #[arg(long)]
    pub(crate) tema: i64,
    #[arg(long)]
    pub(crate) titulo: String,
    #[arg(long)]
    pub(crate) descripcion: Option<String>,
    #[arg(help = "File to upload")]
    pub(crate) file: PathBuf,
}

#[derive(Args)]
pub(crate) struct MaterialDownloadArgs {
    pub(crate) id: i64,
    #[arg(long, short = 'o', help = "Target directory or file (defaults to the current directory)")]
    pub(crate) out: Option<PathBuf>,
}

#[derive(Subcommand)]
pub(crate) enum InscripcionesCommand {
    Ls(ByPromocionArgs),
}

#[derive(Subcommand)]
pub(crate) enum ExamenesCommand {
    Ls(ByTemaArgs),
    Preguntas(ExamenSittingArgs),
    Responder(ResponderArgs),
}

#[derive(Args)]
pub(crate) struct ExamenSittingArgs {
    pub(crate) id: i64,
    #[arg(long)]
    pub(crate) recuperacion: Option<i64>,
}

#[derive(Args)]
pub(crate) struct ResponderArgs {
    pub(crate) id: i64,
    #[arg(
        long = "answer",
        short = 'a',
        value_parser = parse_answer,
        required = true,
        help = "Answer as pregunta_id=respuesta; repeat per question"
    )]
    pub(crate) answers: Vec<AnswerArg>,
    #[arg(long)]
    pub(crate) recuperacion: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AnswerArg {
    pub(crate) pregunta_id: i64,
    pub(crate) respuesta: String,
}

#[derive(Subcommand)]
pub(crate) enum RecuperacionesCommand {
    Ls(RecuperacionesListArgs),
    Contar(ContarArgs),
}

#[derive(Args, Default)]
pub(crate) struct RecuperacionesListArgs {
    #[arg(long)]
    pub(crate) examen: Option<i64>,
    #[arg(long)]
    pub(crate) inscripcion: Option<i64>,
}

#[derive(Args)]
pub(crate) struct ContarArgs {
    #[arg(long)]
    pub(crate) inscripcion: i64,
}

#[derive(Subcommand)]
pub(crate) enum CalificacionesCommand {
    Ls(CalificacionesListArgs),
}

#[derive(Args, Default)]
pub(crate) struct CalificacionesListArgs {
    #[arg(long)]
    pub(crate) examen: Option<i64>,
}

#[derive(Subcommand)]
pub(crate) enum PromediosCommand {
    Ls(ByPromocionArgs),
    Calcular(PromocionActionArgs),
}

#[derive(Args)]
pub(crate) struct PromocionActionArgs {
    #[arg(long)]
    pub(crate) promocion: i64,
}

#[derive(Subcommand)]
pub(crate) enum DiplomasCommand {
    Ls,
    Generar(PromocionActionArgs),
}

#[derive(Subcommand)]
pub(crate) enum UsuariosCommand {
    Ls(UsuariosListArgs),
    Create(UsuarioCreateArgs),
}

#[derive(Args, Default)]
pub(crate) struct UsuariosListArgs {
    #[arg(long, value_parser = parse_role)]
    pub(crate) tipo: Option<UserRole>,
}

#[derive(Args)]
pub(crate) struct UsuarioCreateArgs {
    pub(crate) username: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) first_name: String,
    #[arg(long)]
    pub(crate) last_name: String,
    #[arg(long, value_parser = parse_role, default_value = "alumno")]
    pub(crate) tipo: UserRole,
    #[arg(long, help = "Initial password; generated by the server when omitted")]
    pub(crate) password: Option<String>,
    #[arg(long)]
    pub(crate) telefono: Option<String>,
}

fn parse_refresh_policy(input: &str) -> Result<RefreshPolicy, String> {
    input.parse().map_err(|_| {
        format!("invalid refresh policy '{input}' (expected per-request or shared)")
    })
}

fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input.parse().map_err(|err: aula_telemetry::TelemetryError| err.to_string())
}

fn parse_role(input: &str) -> Result<UserRole, String> {
    input.parse()
}

pub(crate) fn parse_answer(input: &str) -> Result<AnswerArg, String> {
    let (id, answer) = input
        .split_once('=')
        .ok_or_else(|| format!("answer '{input}' must look like pregunta_id=respuesta"))?;
    let pregunta_id = id
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("question id '{}' is not a number", id.trim()))?;
    let respuesta = answer.trim();
    if respuesta.is_empty() {
        return Err(format!("answer for question {pregunta_id} is empty"));
    }
    Ok(AnswerArg {
        pregunta_id,
        respuesta: respuesta.to_string(),
    })
}
