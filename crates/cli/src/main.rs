use api_shared::{ExplainReq, SeverityLevel};
use clap::{Parser, Subcommand};
use saathi_core::{
    analysis::{get_abnormal_parameters, group_parameters_by_category},
    explain::Explainer,
    ocr::{check_confidence, extractor_from_config},
    parser::parse_medical_report,
    reference_ranges::REFERENCE_RANGES,
    score::{calculate_health_clarity_score, generate_score_summary},
    timeline::generate_action_timeline,
    validation::{validate_file_size, validate_file_type},
    CoreConfig, OcrEngine,
};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "saathi")]
#[command(about = "Swasthya Saathi lab report tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run OCR and parsing on a local report and print the scored result as JSON
    Analyse {
        /// PDF, PNG or JPEG lab report
        file: PathBuf,
        /// OCR engine: tesseract or sample (defaults to SAATHI_OCR_ENGINE)
        #[arg(long)]
        engine: Option<String>,
    },
    /// List the built-in reference ranges
    Ranges {
        /// Only show one category, e.g. "Lipid Profile"
        #[arg(long)]
        category: Option<String>,
    },
    /// Print the offline explanation for a parameter
    Explain {
        /// Parameter name, e.g. Hemoglobin
        parameter: String,
        /// Status: low, normal or high
        status: String,
        /// Category for extra context (optional)
        #[arg(long)]
        category: Option<String>,
    },
    /// Print the follow-up timeline for a severity level
    Timeline {
        /// low, moderate or high
        severity: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Analyse { file, engine }) => {
            let mut cfg = CoreConfig::from_lookup(|key| std::env::var(key).ok())?;
            if let Some(engine) = engine {
                cfg = cfg.with_ocr_engine(engine.parse::<OcrEngine>()?);
            }

            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            validate_file_type(&filename)?;
            let bytes = tokio::fs::read(&file).await?;
            validate_file_size(bytes.len(), cfg.max_file_size_mb())?;

            let extractor = extractor_from_config(&cfg);
            let ocr = extractor.extract(&bytes, &filename).await;
            let (acceptable, message) = check_confidence(&ocr, cfg.ocr_confidence_threshold());
            if !ocr.success {
                eprintln!("{}", message);
                std::process::exit(1);
            }

            let parameters = parse_medical_report(&ocr.text);
            let score = calculate_health_clarity_score(&parameters);
            let output = json!({
                "filename": filename,
                "ocr_engine": extractor.name(),
                "ocr_confidence": ocr.confidence,
                "confidence_acceptable": acceptable,
                "confidence_message": message,
                "page_count": ocr.page_count,
                "health_clarity_score": generate_score_summary(&score, None),
                "abnormal_parameters": get_abnormal_parameters(&parameters),
                "parameters_by_category": group_parameters_by_category(&parameters),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Some(Commands::Ranges { category }) => {
            let wanted = category.map(|c| c.trim().to_lowercase());
            let ranges = REFERENCE_RANGES
                .iter()
                .filter(|r| wanted.as_deref().map_or(true, |c| r.category.to_lowercase() == c));
            for range in ranges {
                println!(
                    "{:<28} {:<16} {:<12} {}",
                    range.display_name,
                    range.display_range(),
                    range.unit,
                    range.category
                );
            }
        }
        Some(Commands::Explain {
            parameter,
            status,
            category,
        }) => {
            // No providers: always the offline table
            let res = Explainer::default()
                .generate_explanation(&ExplainReq {
                    parameter_name: parameter,
                    status,
                    trend: None,
                    category,
                })
                .await;
            println!("{}\n", res.explanation);
            println!("{}", res.educational_context);
            if let Some(context) = res.category_context {
                println!("{}", context);
            }
            println!("\n{}", res.disclaimer);
        }
        Some(Commands::Timeline { severity }) => match SeverityLevel::from_label(&severity) {
            Some(level) => {
                let timeline = generate_action_timeline(level);
                for phase in timeline.phases {
                    println!("{}", phase.timeframe);
                    for action in phase.actions {
                        println!("  - {}: {}", action.title, action.description);
                    }
                }
                println!("\n{}", timeline.disclaimer);
            }
            None => eprintln!("Unknown severity '{}': expected low, moderate or high", severity),
        },
        None => {
            println!("Use --help for more information");
        }
    }

    Ok(())
}
