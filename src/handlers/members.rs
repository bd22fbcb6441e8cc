use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::catalog_service::{require_name, CatalogService};
use crate::domain::model::{Address, Member};
use crate::domain::ports::MemberRepository;
use crate::errors::AppError;
use crate::infrastructure::order_store::{read_snapshot, read_write};

use super::{AppState, CreatedResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMemberRequest {
    pub name: String,
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMemberRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MemberResponse {
    pub id: Uuid,
    pub name: String,
    pub address: Address,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        MemberResponse {
            id: member.id,
            name: member.name,
            address: member.address,
        }
    }
}

/// POST /api/members
#[utoipa::path(
    post,
    path = "/api/members",
    request_body = CreateMemberRequest,
    responses(
        (status = 201, description = "Member created", body = CreatedResponse),
        (status = 400, description = "Blank name"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "members"
)]
pub async fn create_member(
    state: web::Data<AppState>,
    body: web::Json<CreateMemberRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    require_name(&body.name)?;
    let member = Member::new(body.name, Address::new(body.city, body.street, body.zipcode));

    let id = web::block(move || {
        let mut conn = state.pool.get()?;
        read_write(&mut conn, |store| {
            store.insert_member(&member)?;
            log::info!("member {} joined", member.id);
            Ok(member.id)
        })
    })
    .await??;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

/// GET /api/members
#[utoipa::path(
    get,
    path = "/api/members",
    responses(
        (status = 200, description = "All members by name", body = Vec<MemberResponse>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "members"
)]
pub async fn list_members(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let members = web::block(move || {
        let mut conn = state.pool.get()?;
        read_snapshot(&mut conn, |store| store.find_all_members())
    })
    .await??;

    let members: Vec<MemberResponse> = members.into_iter().map(MemberResponse::from).collect();
    Ok(HttpResponse::Ok().json(members))
}

/// GET /api/members/{id}
#[utoipa::path(
    get,
    path = "/api/members/{id}",
    params(
        ("id" = Uuid, Path, description = "Member UUID"),
    ),
    responses(
        (status = 200, description = "Member found", body = MemberResponse),
        (status = 404, description = "Member not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "members"
)]
pub async fn get_member(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let member = web::block(move || {
        let mut conn = state.pool.get()?;
        read_snapshot(&mut conn, |store| CatalogService::new(store).member(id))
    })
    .await??;

    Ok(HttpResponse::Ok().json(MemberResponse::from(member)))
}

/// PUT /api/members/{id}
///
/// Renames the member and returns it as stored.
#[utoipa::path(
    put,
    path = "/api/members/{id}",
    params(
        ("id" = Uuid, Path, description = "Member UUID"),
    ),
    request_body = UpdateMemberRequest,
    responses(
        (status = 200, description = "Member renamed", body = MemberResponse),
        (status = 400, description = "Blank name"),
        (status = 404, description = "Member not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "members"
)]
pub async fn update_member(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateMemberRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    require_name(&body.name)?;

    let member = web::block(move || {
        let mut conn = state.pool.get()?;
        read_write(&mut conn, |store| {
            CatalogService::new(store).rename_member(id, &body.name)
        })
    })
    .await??;

    Ok(HttpResponse::Ok().json(MemberResponse::from(member)))
}
