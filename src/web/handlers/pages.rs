use std::sync::Arc;

use actix_web::{http::header, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use handlebars::Handlebars;
use log::error;
use serde::Serialize;
use serde_json::json;

use crate::core::component::ComponentError;
use crate::engine::generator::CustomAccountInput;
use crate::engine::scoring::risk_distribution;
use crate::model::{AssessedAccount, RiskDistribution, RiskLevel};
use crate::web::handlers::batch::{generate_and_analyze, lookup};
use crate::web::models::{format_levels, parse_levels, BatchQuery, BatchRequest};
use crate::web::server::AppState;

const PARTIALS: [(&str, &str); 4] = [
    ("header", include_str!("../templates/partials/header.hbs")),
    ("footer", include_str!("../templates/partials/footer.hbs")),
    ("account_card", include_str!("../templates/partials/account_card.hbs")),
    ("summary", include_str!("../templates/partials/summary.hbs")),
];

const PAGES: [(&str, &str); 6] = [
    ("index", include_str!("../templates/index.hbs")),
    ("demo", include_str!("../templates/demo.hbs")),
    ("batch_form", include_str!("../templates/batch_form.hbs")),
    ("batch", include_str!("../templates/batch.hbs")),
    ("single", include_str!("../templates/single.hbs")),
    ("404", include_str!("../templates/404.hbs")),
];

/// Shared handlebars instance
lazy_static::lazy_static! {
    static ref HBS: Arc<Handlebars<'static>> = {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(false);
        for (name, source) in PARTIALS {
            if let Err(e) = hbs.register_partial(name, source) {
                error!("Error registering partial {}: {}", name, e);
            }
        }
        for (name, source) in PAGES {
            if let Err(e) = hbs.register_template_string(name, source) {
                error!("Error registering template {}: {}", name, e);
            }
        }
        Arc::new(hbs)
    };
}

/// Everything an account card shows
#[derive(Debug, Serialize)]
pub struct AccountCardView {
    pub account_id: String,
    pub account_type: String,
    pub icon: &'static str,
    pub card_class: &'static str,
    pub risk_score: u8,
    pub risk_level: String,
    pub recommendation: String,
    pub followers: String,
    pub following: String,
    pub posts_per_day: String,
    pub age_days: i64,
    pub explanations: Vec<String>,
}

impl AccountCardView {
    pub fn new(row: &AssessedAccount, now: DateTime<Utc>) -> Self {
        let level = row.assessment.risk_level;
        Self {
            account_id: row.account.account_id.clone(),
            account_type: row.account.account_type.label().to_string(),
            icon: level.icon(),
            card_class: level.css_class(),
            risk_score: row.assessment.risk_score,
            risk_level: level.label().to_string(),
            recommendation: row.assessment.recommendation.clone(),
            followers: format_thousands(row.account.followers),
            following: format_thousands(row.account.following),
            posts_per_day: format!("{:.2}", row.account.posts_per_day),
            age_days: row.account.age_days(now),
            explanations: row.assessment.explanations.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Summary tiles for a set of assessments
#[derive(Debug, Serialize)]
pub struct SummaryView {
    pub total: u64,
    pub low_risk: u64,
    pub moderate_risk: u64,
    pub high_risk: u64,
    pub avg_score: String,
}

impl From<&RiskDistribution> for SummaryView {
    fn from(distribution: &RiskDistribution) -> Self {
        Self {
            total: distribution.total,
            low_risk: distribution.low_risk,
            moderate_risk: distribution.moderate_risk,
            high_risk: distribution.high_risk,
            avg_score: format!("{:.1}", distribution.avg_score),
        }
    }
}

/// `1234567` -> `"1,234,567"`
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn render(template: &str, context: &serde_json::Value) -> HttpResponse {
    render_with_status(template, context, HttpResponse::Ok())
}

fn render_with_status(
    template: &str,
    context: &serde_json::Value,
    mut builder: actix_web::HttpResponseBuilder,
) -> HttpResponse {
    match HBS.render(template, context) {
        Ok(body) => builder.content_type("text/html; charset=utf-8").body(body),
        Err(e) => {
            error!("Template rendering error: {}", e);
            HttpResponse::InternalServerError().body(format!("Template error: {}", e))
        }
    }
}

fn error_page(e: &ComponentError) -> HttpResponse {
    let builder = match e {
        ComponentError::NotFound(_) => HttpResponse::NotFound(),
        ComponentError::ValidationError(_) => HttpResponse::BadRequest(),
        _ => HttpResponse::InternalServerError(),
    };
    let context = json!({
        "title": "Not Available | Account Risk Assessment",
        "message": e.to_string(),
    });
    render_with_status("404", &context, builder)
}

/// Serve the index/home page
pub async fn index(data: web::Data<AppState>) -> impl Responder {
    let orchestrator = data.orchestrator.read().await;
    let status = orchestrator.get_status();

    let context = json!({
        "title": "Account Risk Assessment",
        "system_status": format!("{:?}", status.state),
        "active_components": status.active_components,
        "version": env!("CARGO_PKG_VERSION"),
        "levels": RiskLevel::ALL.iter().map(|level| json!({
            "icon": level.icon(),
            "label": level.label(),
            "recommendation": level.recommendation(),
        })).collect::<Vec<_>>(),
    });

    render("index", &context)
}

/// Serve the demo page
pub async fn demo(data: web::Data<AppState>) -> impl Responder {
    let accounts = match data.data_generator.write().await.demo() {
        Ok(accounts) => accounts,
        Err(e) => return error_page(&e),
    };
    let rows = match data.risk_engine.write().await.analyze(accounts) {
        Ok(rows) => rows,
        Err(e) => return error_page(&e),
    };

    let now = data.clock.now();
    let distribution = risk_distribution(rows.iter().map(|row| &row.assessment));
    let cards: Vec<AccountCardView> = rows.iter().map(|row| AccountCardView::new(row, now)).collect();

    let context = json!({
        "title": "Demo Accounts | Account Risk Assessment",
        "cards": cards,
        "summary": SummaryView::from(&distribution),
    });

    render("demo", &context)
}

/// Serve the batch generation form
pub async fn batch_form(data: web::Data<AppState>) -> impl Responder {
    let bounds = data.data_generator.read().await.batch_bounds();
    render("batch_form", &batch_form_context(bounds, bounds.1, None))
}

/// Generate and analyse a batch, then redirect to it
pub async fn batch_create(data: web::Data<AppState>, form: web::Form<BatchRequest>) -> impl Responder {
    match generate_and_analyze(&data, form.size).await {
        Ok(batch) => HttpResponse::SeeOther()
            .insert_header((header::LOCATION, format!("/batch/{}", batch.batch_id)))
            .finish(),
        Err(ComponentError::ValidationError(message)) => {
            let bounds = data.data_generator.read().await.batch_bounds();
            let size = form.size.unwrap_or(bounds.1);
            render_with_status(
                "batch_form",
                &batch_form_context(bounds, size, Some(message)),
                HttpResponse::BadRequest(),
            )
        }
        Err(e) => error_page(&e),
    }
}

fn batch_form_context(bounds: (usize, usize, usize), size: usize, error: Option<String>) -> serde_json::Value {
    json!({
        "title": "Batch Analysis | Account Risk Assessment",
        "min": bounds.0,
        "max": bounds.2,
        "size": size,
        "error": error,
    })
}

/// Serve a batch: summary, charts, filtered table and optional detail card
pub async fn batch_view(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<BatchQuery>,
) -> impl Responder {
    let levels = match parse_levels(query.levels.as_deref()) {
        Ok(levels) => levels,
        Err(e) => return error_page(&e),
    };
    let batch = match lookup(&data, &path).await {
        Ok(batch) => batch,
        Err(e) => return error_page(&e),
    };

    let now = data.clock.now();
    let filter = format_levels(&levels);
    let base_url = format!("/batch/{}", batch.batch_id);

    // each chip links to the current filter with its level toggled
    let chips: Vec<serde_json::Value> = RiskLevel::ALL
        .iter()
        .map(|level| {
            let active = levels.contains(level);
            let toggled: Vec<RiskLevel> = RiskLevel::ALL
                .iter()
                .copied()
                .filter(|l| if l == level { !active } else { levels.contains(l) })
                .collect();
            json!({
                "label": level.label(),
                "icon": level.icon(),
                "active": active,
                "href": format!("{}?levels={}", base_url, format_levels(&toggled)),
            })
        })
        .collect();

    let rows: Vec<serde_json::Value> = batch
        .filtered(&levels)
        .into_iter()
        .map(|row| {
            json!({
                "account_id": row.account.account_id,
                "account_type": row.account.account_type.label(),
                "risk_score": row.assessment.risk_score,
                "risk_level": row.assessment.risk_level.label(),
                "row_class": row.assessment.risk_level.css_class(),
                "followers": format_thousands(row.account.followers),
                "following": format_thousands(row.account.following),
                "posts_per_day": format!("{:.2}", row.account.posts_per_day),
                "href": format!("{}?levels={}&account={}", base_url, filter, row.account.account_id),
                "selected": query.account.as_deref() == Some(row.account.account_id.as_str()),
            })
        })
        .collect();

    let selected = query
        .account
        .as_deref()
        .and_then(|account_id| batch.find(account_id))
        .map(|row| AccountCardView::new(row, now));
    let missing_account = query.account.is_some() && selected.is_none();

    let context = json!({
        "title": "Batch Results | Account Risk Assessment",
        "batch_id": batch.batch_id,
        "created_at": batch.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        "summary": SummaryView::from(&batch.distribution),
        "chips": chips,
        "rows": rows,
        "shown": rows.len(),
        "selected": selected,
        "missing_account": missing_account,
    });

    render("batch", &context)
}

/// Serve the single-account form with default values
pub async fn single_form() -> impl Responder {
    render("single", &single_context(&CustomAccountInput::default(), None, None))
}

/// Assess a manually entered account
pub async fn single_assess(data: web::Data<AppState>, form: web::Form<CustomAccountInput>) -> impl Responder {
    let input = form.into_inner();

    let account = match data.data_generator.write().await.custom(&input) {
        Ok(account) => account,
        Err(ComponentError::ValidationError(message)) => {
            return render_with_status(
                "single",
                &single_context(&input, None, Some(message)),
                HttpResponse::BadRequest(),
            );
        }
        Err(e) => return error_page(&e),
    };
    let assessment = match data.risk_engine.write().await.assess(&account) {
        Ok(assessment) => assessment,
        Err(e) => return error_page(&e),
    };

    let row = AssessedAccount { account, assessment };
    let card = AccountCardView::new(&row, data.clock.now());
    render("single", &single_context(&input, Some(card), None))
}

fn single_context(input: &CustomAccountInput, card: Option<AccountCardView>, error: Option<String>) -> serde_json::Value {
    json!({
        "title": "Single Account | Account Risk Assessment",
        "input": input,
        "posts_per_day": format!("{:.2}", input.posts_per_day()),
        "card": card,
        "error": error,
    })
}

/// 404 Not Found handler
pub async fn not_found() -> impl Responder {
    let context = json!({
        "title": "Page Not Found | Account Risk Assessment",
    });

    render_with_status("404", &context, HttpResponse::NotFound())
}
