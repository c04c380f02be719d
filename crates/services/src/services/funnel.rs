use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use db::models::{
    admission::{Admission, CreateAdmission},
    certified_admission::{CertifiedAdmission, CreateCertifiedAdmission},
    other_admission::{
        CreateOtherAdmission, EnrollmentFields, OtherAdmission, OtherAdmissionError,
    },
    record::{Record, RecordError},
    user::User,
};
use db::types::{AdmissionType, VisitStatus};
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FunnelError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Record not found")]
    RecordNotFound,
    #[error("Admission not found")]
    AdmissionNotFound,
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

impl From<RecordError> for FunnelError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Database(e) => FunnelError::Database(e),
            RecordError::RecordNotFound => FunnelError::RecordNotFound,
        }
    }
}

impl From<OtherAdmissionError> for FunnelError {
    fn from(err: OtherAdmissionError) -> Self {
        match err {
            OtherAdmissionError::Database(e) => FunnelError::Database(e),
            OtherAdmissionError::AdmissionNotFound => FunnelError::AdmissionNotFound,
        }
    }
}

/// Enrollment payload as it arrives from the API; dates are optional ISO-8601
/// strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrollmentDetail {
    pub discount_rate: Option<f64>,
    pub enrolled_course: Option<String>,
    pub fees_paid: Option<i64>,
    pub course_total_fees: Option<i64>,
    pub course_start_date: Option<String>,
    pub course_end_date: Option<String>,
    pub payment_mode: Option<String>,
}

fn parse_iso_date(value: &str) -> Result<DateTime<Utc>, FunnelError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }
    Err(FunnelError::InvalidDate(value.to_string()))
}

fn parse_optional_date(value: Option<&str>) -> Result<Option<DateTime<Utc>>, FunnelError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_iso_date(v).map(Some),
        None => Ok(None),
    }
}

impl EnrollmentDetail {
    fn into_fields(self) -> Result<EnrollmentFields, FunnelError> {
        let course_start_date = parse_optional_date(self.course_start_date.as_deref())?;
        let course_end_date = parse_optional_date(self.course_end_date.as_deref())?;
        Ok(EnrollmentFields {
            discount_rate: self.discount_rate,
            // Legacy field fed from the course total.
            total_fees: self.course_total_fees.map(|v| v as f64),
            enrolled_course: self.enrolled_course,
            fees_paid: self.fees_paid,
            course_total_fees: self.course_total_fees,
            course_start_date,
            course_end_date,
            payment_mode: self.payment_mode,
        })
    }
}

async fn caller_name_for<C: sea_orm::ConnectionTrait>(
    db: &C,
    caller_id: Option<i64>,
) -> Result<String, DbErr> {
    if let Some(id) = caller_id {
        if let Some(user) = User::find_by_id(db, id).await? {
            return Ok(user.name);
        }
    }
    Ok("Unknown".to_string())
}

/// Moves a record through the visit funnel.
///
/// `Confirmed` additionally writes one certified-admission log row and one
/// legacy admission marker, snapshotting the record and its caller at this
/// moment. The other statuses only update the record.
pub async fn set_visit_status(
    db: &DatabaseConnection,
    record_id: i64,
    status: VisitStatus,
    acting_user_id: i64,
) -> Result<Record, FunnelError> {
    let txn = db.begin().await?;

    let record = Record::find_by_id(&txn, record_id)
        .await?
        .ok_or(FunnelError::RecordNotFound)?;
    let updated = Record::set_visit(&txn, record_id, status.clone(), acting_user_id).await?;

    if status == VisitStatus::Confirmed {
        let caller_name = caller_name_for(&txn, record.caller_id).await?;
        CertifiedAdmission::create(
            &txn,
            &CreateCertifiedAdmission {
                record_id,
                phone_number: record.phone_number.clone(),
                name: record.name.clone().unwrap_or_default(),
                caller_name,
                response: record.response.clone(),
                processed_by: acting_user_id,
            },
        )
        .await?;
        Admission::create(
            &txn,
            &CreateAdmission {
                record_id,
                admission_type: AdmissionType::Confirmed,
                discount_rate: None,
                total_fees: None,
                enrolled_course: None,
                processed_by: acting_user_id,
            },
        )
        .await?;
        tracing::info!(record_id, "visit confirmed, admission logged");
    }

    txn.commit().await?;
    Ok(updated)
}

/// Records an enrollment against a record and forces its visit to confirmed,
/// whatever state it was in. One detail row plus one legacy marker.
pub async fn record_enrollment(
    db: &DatabaseConnection,
    record_id: i64,
    detail: EnrollmentDetail,
    acting_user_id: i64,
) -> Result<OtherAdmission, FunnelError> {
    let fields = detail.into_fields()?;

    let txn = db.begin().await?;

    let record = Record::find_by_id(&txn, record_id)
        .await?
        .ok_or(FunnelError::RecordNotFound)?;
    let caller_name = caller_name_for(&txn, record.caller_id).await?;

    let admission = OtherAdmission::create(
        &txn,
        &CreateOtherAdmission {
            record_id,
            phone_number: record.phone_number.clone(),
            name: record.name.clone().unwrap_or_default(),
            caller_name,
            response: record.response.clone(),
            fields: fields.clone(),
            processed_by: acting_user_id,
        },
    )
    .await?;
    Admission::create(
        &txn,
        &CreateAdmission {
            record_id,
            admission_type: AdmissionType::Other,
            discount_rate: fields.discount_rate,
            total_fees: fields.total_fees,
            enrolled_course: fields.enrolled_course.clone(),
            processed_by: acting_user_id,
        },
    )
    .await?;
    Record::set_visit(&txn, record_id, VisitStatus::Confirmed, acting_user_id).await?;

    txn.commit().await?;
    tracing::info!(record_id, admission_id = admission.id, "enrollment recorded");
    Ok(admission)
}

/// Rewrites the financial fields of an enrollment. The owning record's visit
/// status is left alone.
pub async fn update_enrollment(
    db: &DatabaseConnection,
    admission_id: i64,
    detail: EnrollmentDetail,
) -> Result<OtherAdmission, FunnelError> {
    let fields = detail.into_fields()?;
    let updated = OtherAdmission::update(db, admission_id, &fields).await?;
    Ok(updated)
}

/// Deletes an enrollment detail row. The owning record stays confirmed.
pub async fn delete_enrollment(
    db: &DatabaseConnection,
    admission_id: i64,
) -> Result<(), FunnelError> {
    let deleted = OtherAdmission::delete(db, admission_id).await?;
    if deleted == 0 {
        return Err(FunnelError::AdmissionNotFound);
    }
    Ok(())
}
