use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Matchday Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::field_stream,
        crate::routes::sse::judging_stream,
        crate::routes::sse::team_arrival_stream,
        crate::routes::field::list_matches,
        crate::routes::field::load_match,
        crate::routes::field::start_match,
        crate::routes::field::start_test_match,
        crate::routes::field::abort_match,
        crate::routes::field::update_match_teams,
        crate::routes::field::switch_match_teams,
        crate::routes::field::merge_matches,
        crate::routes::field::update_match_brief,
        crate::routes::field::update_match_participant,
        crate::routes::field::update_scoresheet,
        crate::routes::judging::list_sessions,
        crate::routes::judging::start_session,
        crate::routes::judging::abort_session,
        crate::routes::judging::update_session_team,
        crate::routes::judging::update_session,
        crate::routes::judging::start_deliberation,
        crate::routes::judging::update_deliberation,
        crate::routes::judging::complete_deliberation,
        crate::routes::judging::disqualify_team,
        crate::routes::judging::update_award_winners,
        crate::routes::judging::advance_teams,
        crate::routes::judging::create_cv_form,
        crate::routes::judging::update_cv_form,
        crate::routes::judging::call_lead_judge,
        crate::routes::team::update_team_arrival,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::common::OkResponse,
            crate::dto::field::TeamAssignment,
            crate::dto::field::UpdateMatchTeamsRequest,
            crate::dto::field::SwitchMatchTeamsRequest,
            crate::dto::field::MergeMatchesRequest,
            crate::dto::field::UpdateMatchBriefRequest,
            crate::dto::field::UpdateMatchParticipantRequest,
            crate::dto::field::UpdateScoresheetRequest,
            crate::dto::judging::UpdateSessionTeamRequest,
            crate::dto::judging::UpdateSessionRequest,
            crate::dto::judging::UpdateDeliberationRequest,
            crate::dto::judging::DisqualifyTeamRequest,
            crate::dto::judging::UpdateAwardWinnersRequest,
            crate::dto::judging::AdvanceTeamsRequest,
            crate::dto::judging::CvFormRequest,
            crate::dto::team::UpdateTeamArrivalRequest,
            crate::dao::models::Status,
            crate::dao::models::MatchStage,
            crate::dao::models::MatchParticipant,
            crate::dao::models::GameMatch,
            crate::dao::models::JudgingSession,
            crate::dao::models::JudgingDeliberation,
            crate::dao::models::DivisionState,
            crate::dao::models::Award,
            crate::dao::models::Scoresheet,
            crate::dao::models::CvForm,
            crate::dao::models::Room,
            crate::dao::models::Team,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "field", description = "Robot-game match operations"),
        (name = "judging", description = "Judging session, deliberation and award operations"),
        (name = "team", description = "Live team roster flags"),
    )
)]
pub struct ApiDoc;
