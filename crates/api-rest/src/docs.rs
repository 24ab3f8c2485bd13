//! OpenAPI document served by Swagger UI at `/docs`.

use crate::handlers;
use api_shared::{
    ActionPriority, ActionTimelineItem, ActionTimelinePhase, ActionTimelineRes, ErrorRes,
    ExplainReq, ExplainRes, ExtractionSource, HealthClarityScore, HealthRes, Parameter,
    ParameterStatus, ParameterTrend, ParameterTrendData, ReportDetail, ReportHistory,
    ReportSummary, RootRes, ScoreSummary, ScoreTrend, ScoreTrendPoint, SeverityLevel,
    TrendDataPoint, TrendRes, UploadRes,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Swasthya Saathi API",
        description = "Turns lab reports into plain-language, scored summaries. Educational use only; not medical advice."
    ),
    paths(
        handlers::root,
        handlers::health,
        handlers::upload_report,
        handlers::latest_report,
        handlers::report_history,
        handlers::report_by_id,
        handlers::trends,
        handlers::explain_parameter,
        handlers::clarity_score,
        handlers::action_timeline,
    ),
    components(schemas(
        handlers::UploadForm,
        ActionPriority,
        ActionTimelineItem,
        ActionTimelinePhase,
        ActionTimelineRes,
        ErrorRes,
        ExplainReq,
        ExplainRes,
        ExtractionSource,
        HealthClarityScore,
        HealthRes,
        Parameter,
        ParameterStatus,
        ParameterTrend,
        ParameterTrendData,
        ReportDetail,
        ReportHistory,
        ReportSummary,
        RootRes,
        ScoreSummary,
        ScoreTrend,
        ScoreTrendPoint,
        SeverityLevel,
        TrendDataPoint,
        TrendRes,
        UploadRes,
    )),
    tags((name = "reports", description = "Lab report analysis"))
)]
pub struct ApiDoc;
