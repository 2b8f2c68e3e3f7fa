use axum::{
    Router,
    extract::{Json, Query},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::chart::{ChartRecord, DEFAULT_SAMPLE_LINES, build_chart, export_csv};
use crate::core::{
    DEFAULT_LIFE_EXPECTANCY, DEFAULT_TRIALS, EntropyRng, EnvelopeBands, Insights, InvestorProfile,
    MonteCarloResult, ProfileParams, ProjectionInput, RandomSource, SeededRng, SimulationConfig,
    SuccessCriterion, project,
};
use crate::error::{ExportError, ProjectionError};

const MAX_SAMPLE_LINES: usize = 500;
const MAX_TRIALS: u32 = 100_000;
const CSV_FILE_NAME: &str = "planejamento_aposentadoria.csv";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CliSuccessCriterion {
    #[default]
    SolventAtHorizon,
    IncomeFullyFunded,
}

impl From<CliSuccessCriterion> for SuccessCriterion {
    fn from(value: CliSuccessCriterion) -> Self {
        match value {
            CliSuccessCriterion::SolventAtHorizon => SuccessCriterion::SolventAtHorizon,
            CliSuccessCriterion::IncomeFullyFunded => SuccessCriterion::IncomeFullyFunded,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct Cli {
    #[arg(long, default_value_t = 15_000.0)]
    pub initial_amount: f64,
    #[arg(long, default_value_t = 1_000.0)]
    pub monthly_amount: f64,
    #[arg(long, default_value_t = 30)]
    pub current_age: u32,
    #[arg(long, default_value_t = 65)]
    pub retirement_age: u32,
    #[arg(long, default_value_t = DEFAULT_LIFE_EXPECTANCY)]
    pub life_expectancy: u32,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Desired monthly income in retirement; 0 draws 0.4% of wealth per month"
    )]
    pub monthly_income_target: f64,
    #[arg(long, default_value_t = 4.0, help = "Retirement-phase return in percent")]
    pub portfolio_return: f64,
    #[arg(long, default_value_t = InvestorProfile::Moderate)]
    pub profile: InvestorProfile,
    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    pub trials: u32,
    #[arg(long, help = "Fixed seed for reproducible runs")]
    pub seed: Option<u64>,
    #[arg(long, default_value_t = 5.0)]
    pub envelope_lower: f64,
    #[arg(long, default_value_t = 95.0)]
    pub envelope_upper: f64,
    #[arg(long, value_enum, default_value_t = CliSuccessCriterion::SolventAtHorizon)]
    pub success_criterion: CliSuccessCriterion,
    #[arg(long)]
    pub no_monte_carlo: bool,
    #[arg(long, default_value_t = DEFAULT_SAMPLE_LINES)]
    pub sample_lines: usize,
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            initial_amount: 15_000.0,
            monthly_amount: 1_000.0,
            current_age: 30,
            retirement_age: 65,
            life_expectancy: DEFAULT_LIFE_EXPECTANCY,
            monthly_income_target: 0.0,
            portfolio_return: 4.0,
            profile: InvestorProfile::Moderate,
            trials: DEFAULT_TRIALS,
            seed: None,
            envelope_lower: 5.0,
            envelope_upper: 95.0,
            success_criterion: CliSuccessCriterion::SolventAtHorizon,
            no_monte_carlo: false,
            sample_lines: DEFAULT_SAMPLE_LINES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionPayload {
    initial_amount: Option<f64>,
    monthly_amount: Option<f64>,
    current_age: Option<u32>,
    retirement_age: Option<u32>,
    accumulation_years: Option<u32>,
    life_expectancy: Option<u32>,
    monthly_income_target: Option<f64>,
    portfolio_return: Option<f64>,
    #[serde(alias = "profile")]
    investor_profile: Option<InvestorProfile>,
    trials: Option<u32>,
    seed: Option<u64>,
    envelope_lower: Option<f64>,
    envelope_upper: Option<f64>,
    success_criterion: Option<CliSuccessCriterion>,
    monte_carlo: Option<bool>,
    sample_lines: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionRequest {
    pub input: ProjectionInput,
    pub config: SimulationConfig,
    pub monte_carlo: bool,
    pub seed: Option<u64>,
    pub sample_lines: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResponse {
    pub profile: &'static ProfileParams,
    pub trajectory: Vec<f64>,
    pub savings_line: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monte_carlo: Option<MonteCarloResult>,
    pub chart: Vec<ChartRecord>,
    pub insights: Insights,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Projection(_) => StatusCode::BAD_REQUEST,
            ApiError::Export(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "projection request failed");
        }
        json_response(
            status,
            ErrorResponse {
                error: self.to_string(),
            },
        )
    }
}

pub fn build_inputs(cli: &Cli) -> Result<ProjectionRequest, ApiError> {
    if cli.retirement_age < cli.current_age {
        return Err(ApiError::BadRequest(
            "--retirement-age must be >= --current-age".to_string(),
        ));
    }
    if cli.life_expectancy < cli.retirement_age {
        return Err(ApiError::BadRequest(
            "--life-expectancy must be >= --retirement-age".to_string(),
        ));
    }
    if cli.trials == 0 || cli.trials > MAX_TRIALS {
        return Err(ApiError::BadRequest(format!(
            "--trials must be between 1 and {MAX_TRIALS}"
        )));
    }
    if cli.sample_lines > MAX_SAMPLE_LINES {
        return Err(ApiError::BadRequest(format!(
            "--sample-lines must be <= {MAX_SAMPLE_LINES}"
        )));
    }

    let input = ProjectionInput {
        current_age: cli.current_age,
        accumulation_years: cli.retirement_age - cli.current_age,
        life_expectancy: cli.life_expectancy,
        initial_amount: cli.initial_amount,
        monthly_amount: cli.monthly_amount,
        monthly_income_target: cli.monthly_income_target,
        portfolio_return: cli.portfolio_return,
        profile: cli.profile,
    };
    input.validate()?;

    let config = SimulationConfig {
        trials: cli.trials,
        envelope: EnvelopeBands {
            lower_percentile: cli.envelope_lower,
            upper_percentile: cli.envelope_upper,
        },
        success_criterion: cli.success_criterion.into(),
        ..SimulationConfig::default()
    };
    config.validate()?;

    Ok(ProjectionRequest {
        input,
        config,
        monte_carlo: !cli.no_monte_carlo,
        seed: cli.seed,
        sample_lines: cli.sample_lines,
    })
}

pub fn request_from_payload(payload: ProjectionPayload) -> Result<ProjectionRequest, ApiError> {
    let mut cli = Cli::default();

    if let Some(v) = payload.initial_amount {
        cli.initial_amount = v;
    }
    if let Some(v) = payload.monthly_amount {
        cli.monthly_amount = v;
    }
    if let Some(v) = payload.current_age {
        cli.current_age = v;
    }
    if let Some(v) = payload.retirement_age {
        cli.retirement_age = v;
    }
    if let Some(v) = payload.accumulation_years {
        cli.retirement_age = cli.current_age.saturating_add(v);
    }
    if let Some(v) = payload.life_expectancy {
        cli.life_expectancy = v;
    }
    if let Some(v) = payload.monthly_income_target {
        cli.monthly_income_target = v;
    }
    if let Some(v) = payload.portfolio_return {
        cli.portfolio_return = v;
    }
    if let Some(v) = payload.investor_profile {
        cli.profile = v;
    }
    if let Some(v) = payload.trials {
        cli.trials = v;
    }
    if payload.seed.is_some() {
        cli.seed = payload.seed;
    }
    if let Some(v) = payload.envelope_lower {
        cli.envelope_lower = v;
    }
    if let Some(v) = payload.envelope_upper {
        cli.envelope_upper = v;
    }
    if let Some(v) = payload.success_criterion {
        cli.success_criterion = v;
    }
    if let Some(v) = payload.monte_carlo {
        cli.no_monte_carlo = !v;
    }
    if let Some(v) = payload.sample_lines {
        cli.sample_lines = v;
    }

    build_inputs(&cli)
}

pub fn run_projection(request: &ProjectionRequest) -> Result<ProjectionResponse, ProjectionError> {
    let mut seeded;
    let mut entropy;
    let rng: &mut dyn RandomSource = match request.seed {
        Some(seed) => {
            seeded = SeededRng::new(seed);
            &mut seeded
        }
        None => {
            entropy = EntropyRng::new();
            &mut entropy
        }
    };

    let projection = project(&request.input, &request.config, request.monte_carlo, rng)?;
    let chart = build_chart(&request.input, &projection, request.sample_lines, rng);
    let insights = Insights::from_input(&request.input, &projection.trajectory);

    Ok(ProjectionResponse {
        profile: request.input.profile.params(),
        trajectory: projection.trajectory,
        savings_line: chart.savings_line,
        monte_carlo: projection.monte_carlo,
        chart: chart.records,
        insights,
    })
}

async fn run_projection_blocking(request: ProjectionRequest) -> Result<ProjectionResponse, ApiError> {
    tokio::task::spawn_blocking(move || run_projection(&request))
        .await
        .map_err(|e| ApiError::Internal(format!("projection task failed: {e}")))?
        .map_err(ApiError::from)
}

pub fn router() -> Router {
    Router::new()
        .route(
            "/api/projection",
            get(projection_get_handler).post(projection_post_handler),
        )
        .route("/api/projection.csv", post(projection_csv_handler))
        .route("/api/profiles", get(profiles_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "projection HTTP API listening");
    axum::serve(listener, router()).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn profiles_handler() -> Response {
    let profiles: Vec<&'static ProfileParams> = InvestorProfile::ALL
        .iter()
        .map(|profile| profile.params())
        .collect();
    json_response(StatusCode::OK, profiles)
}

async fn projection_get_handler(Query(payload): Query<ProjectionPayload>) -> Response {
    projection_handler_impl(payload).await
}

async fn projection_post_handler(Json(payload): Json<ProjectionPayload>) -> Response {
    projection_handler_impl(payload).await
}

async fn projection_handler_impl(payload: ProjectionPayload) -> Response {
    let result = async {
        let request = request_from_payload(payload)?;
        run_projection_blocking(request).await
    }
    .await;

    match result {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => err.into_response(),
    }
}

async fn projection_csv_handler(Json(payload): Json<ProjectionPayload>) -> Response {
    let result = async {
        let request = request_from_payload(payload)?;
        let response = run_projection_blocking(request).await?;
        Ok::<_, ApiError>(export_csv(&response.chart)?)
    }
    .await;

    match result {
        Ok(csv) => with_cache_control((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{CSV_FILE_NAME}\""),
                ),
            ],
            csv,
        )),
        Err(err) => err.into_response(),
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn request_from_json(json: &str) -> Result<ProjectionRequest, ApiError> {
    let payload = serde_json::from_str::<ProjectionPayload>(json)
        .map_err(|e| ApiError::BadRequest(format!("Invalid API JSON payload: {e}")))?;
    request_from_payload(payload)
}
