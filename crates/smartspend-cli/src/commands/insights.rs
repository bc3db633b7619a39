//! Insight command implementations
//!
//! Every command reads the user's full history and runs one engine
//! operation over it; `report` runs them all in one pass.

use anyhow::{Context, Result};
use smartspend_core::db::Database;
use smartspend_core::models::{
    Alert, AnomalyInsight, CategoryRisk, ExpenseRecord, ForecastResult, Recommendation, RiskLevel,
    Severity, Trend,
};
use smartspend_core::IntelligenceEngine;

use super::print_json;

fn load_history(db: &Database, user_id: i64) -> Result<Vec<ExpenseRecord>> {
    db.list_expense_history(user_id)
        .with_context(|| format!("Failed to load expenses for user {}", user_id))
}

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "🔴",
        Severity::Medium => "🟡",
        Severity::Low => "🟢",
    }
}

fn risk_icon(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "🔴",
        RiskLevel::Medium => "🟡",
        RiskLevel::Low => "🟢",
    }
}

fn trend_icon(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "📈",
        Trend::Down => "📉",
        Trend::Stable => "➡️ ",
    }
}

fn print_forecast(forecast: &ForecastResult, currency: &str) {
    println!();
    println!("🔮 Next Month Forecast");
    println!("   ─────────────────────────────");

    if let Some(message) = &forecast.message {
        println!("   ⚠️  {}", message);
        if forecast.is_insufficient() {
            return;
        }
    }

    println!(
        "   Predicted spending: {}{:.2}",
        currency, forecast.predicted_amount
    );
    println!("   Confidence: {:.0}%", forecast.confidence * 100.0);
    println!(
        "   {} Trend: {}",
        trend_icon(forecast.trend),
        forecast.trend
    );
    if !forecast.models.is_empty() {
        println!("   Models: {}", forecast.models.join(", "));
    }
}

fn print_risks(risks: &[CategoryRisk], currency: &str) {
    println!();
    println!("💰 Budget Risk");
    println!("   ─────────────────────────────────────────────────────────────");

    if risks.is_empty() {
        println!("   Not enough history to score categories yet.");
        return;
    }

    for risk in risks {
        println!(
            "   {} {:<15} {:>6} │ {:>3.0}% │ expected {}{:.2} of {}{:.2}",
            risk_icon(risk.risk_level),
            risk.category,
            risk.risk_level.as_str(),
            risk.probability * 100.0,
            currency,
            risk.expected_spend,
            currency,
            risk.budget_limit
        );
    }
}

fn print_anomalies(anomalies: &[AnomalyInsight]) {
    println!();
    println!("🚨 Anomalies");
    println!("   ─────────────────────────────");

    if anomalies.is_empty() {
        println!("   ✅ No unusual spending detected.");
        return;
    }

    for anomaly in anomalies {
        println!(
            "   {} [{}] {}",
            severity_icon(anomaly.severity),
            anomaly.kind,
            anomaly.message
        );
    }
}

fn print_recommendations(recommendations: &[Recommendation]) {
    println!();
    println!("💡 Recommendations");
    println!("   ─────────────────────────────");

    for rec in recommendations {
        println!("   {} {}", severity_icon(rec.priority), rec.suggestion);
    }
}

fn print_alerts(alerts: &[Alert]) {
    println!();
    println!("⚠️  Alerts");
    println!("   ─────────────────────────────");

    if alerts.is_empty() {
        println!("   ✅ Nothing needs attention.");
        return;
    }

    for alert in alerts {
        println!(
            "   {} {} ({}): {}",
            severity_icon(alert.severity),
            alert.alert_type,
            alert.category,
            alert.message
        );
    }
}

fn print_explanations(explanations: &[String]) {
    println!();
    println!("🧾 Spending Behavior");
    println!("   ─────────────────────────────");

    for line in explanations {
        println!("   • {}", line);
    }
}

pub fn cmd_forecast(
    db: &Database,
    engine: &IntelligenceEngine,
    user_id: i64,
    json: bool,
) -> Result<()> {
    let history = load_history(db, user_id)?;
    let forecast = engine.forecast(&history);

    if json {
        return print_json(&forecast);
    }
    print_forecast(&forecast, &engine.config().narrative.currency_symbol);
    Ok(())
}

pub fn cmd_risk(
    db: &Database,
    engine: &IntelligenceEngine,
    user_id: i64,
    json: bool,
) -> Result<()> {
    let history = load_history(db, user_id)?;
    let risks = engine.assess_budget_risk(&history);

    if json {
        return print_json(&risks);
    }
    print_risks(&risks, &engine.config().narrative.currency_symbol);
    Ok(())
}

pub fn cmd_anomalies(
    db: &Database,
    engine: &IntelligenceEngine,
    user_id: i64,
    json: bool,
) -> Result<()> {
    let history = load_history(db, user_id)?;
    let anomalies = engine.detect_anomalies(&history);

    if json {
        return print_json(&anomalies);
    }
    print_anomalies(&anomalies);
    Ok(())
}

pub fn cmd_recommend(
    db: &Database,
    engine: &IntelligenceEngine,
    user_id: i64,
    json: bool,
) -> Result<()> {
    let history = load_history(db, user_id)?;
    let recommendations = engine.recommend(&history);

    if json {
        return print_json(&recommendations);
    }
    print_recommendations(&recommendations);
    Ok(())
}

pub fn cmd_alerts(
    db: &Database,
    engine: &IntelligenceEngine,
    user_id: i64,
    json: bool,
) -> Result<()> {
    let history = load_history(db, user_id)?;
    let alerts = engine.alert(&history);

    if json {
        return print_json(&alerts);
    }
    print_alerts(&alerts);
    Ok(())
}

pub fn cmd_explain(
    db: &Database,
    engine: &IntelligenceEngine,
    user_id: i64,
    json: bool,
) -> Result<()> {
    let history = load_history(db, user_id)?;
    let explanations = engine.explain(&history);

    if json {
        return print_json(&explanations);
    }
    print_explanations(&explanations);
    Ok(())
}

pub fn cmd_report(
    db: &Database,
    engine: &IntelligenceEngine,
    user_id: i64,
    json: bool,
) -> Result<()> {
    let history = load_history(db, user_id)?;
    let report = engine.report(&history);

    if json {
        return print_json(&report);
    }

    let currency = &engine.config().narrative.currency_symbol;
    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│         💰 SmartSpend Report            │");
    println!("╰─────────────────────────────────────────╯");
    println!("  User {} │ {} expenses analyzed", user_id, history.len());

    print_forecast(&report.forecast, currency);
    print_risks(&report.risks, currency);
    print_anomalies(&report.anomalies);
    print_recommendations(&report.recommendations);
    print_alerts(&report.alerts);
    print_explanations(&report.explanations);
    println!();

    Ok(())
}
