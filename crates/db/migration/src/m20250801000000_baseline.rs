use sea_orm_migration::{prelude::*, sea_orm::DatabaseBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Users::Table)
                    .col(pk_id_col(manager, Users::Id))
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Role).string_len(50).not_null())
                    .col(timestamp_col(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_username")
                    .table(Users::Table)
                    .col(Users::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Records::Table)
                    .col(pk_id_col(manager, Records::Id))
                    .col(fk_id_nullable_col(manager, Records::CallerId))
                    .col(ColumnDef::new(Records::PhoneNumber).string().not_null())
                    .col(ColumnDef::new(Records::Name).string())
                    .col(ColumnDef::new(Records::Response).text())
                    .col(ColumnDef::new(Records::Notes).text())
                    .col(
                        ColumnDef::new(Records::Visit)
                            .string_len(16)
                            .not_null()
                            .default(Expr::val("pending")),
                    )
                    .col(fk_id_nullable_col(manager, Records::VisitBy))
                    .col(
                        ColumnDef::new(Records::HiddenFromCaller)
                            .boolean()
                            .not_null()
                            .default(Expr::val(false)),
                    )
                    .col(timestamp_col(Records::AssignedAt))
                    .col(timestamp_col(Records::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_records_caller_id")
                            .from(Records::Table, Records::CallerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_records_visit_by")
                            .from(Records::Table, Records::VisitBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // No unique index on phone_number: duplicate suppression is an
        // application-level check and concurrent uploads may still race.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_records_phone_number")
                    .table(Records::Table)
                    .col(Records::PhoneNumber)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_records_caller_id")
                    .table(Records::Table)
                    .col(Records::CallerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Tasks::Table)
                    .col(pk_id_col(manager, Tasks::Id))
                    .col(ColumnDef::new(Tasks::Title).string().not_null())
                    .col(ColumnDef::new(Tasks::Description).text())
                    .col(fk_id_col(manager, Tasks::AssignedTo))
                    .col(fk_id_col(manager, Tasks::AssignedBy))
                    .col(ColumnDef::new(Tasks::Deadline).timestamp())
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("pending")),
                    )
                    .col(
                        ColumnDef::new(Tasks::Progress)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(timestamp_col(Tasks::CreatedAt))
                    .col(timestamp_col(Tasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_assigned_to")
                            .from(Tasks::Table, Tasks::AssignedTo)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_assigned_by")
                            .from(Tasks::Table, Tasks::AssignedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tasks_assigned_to")
                    .table(Tasks::Table)
                    .col(Tasks::AssignedTo)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Admissions::Table)
                    .col(pk_id_col(manager, Admissions::Id))
                    .col(fk_id_col(manager, Admissions::RecordId))
                    .col(
                        ColumnDef::new(Admissions::AdmissionType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Admissions::DiscountRate).double())
                    .col(ColumnDef::new(Admissions::TotalFees).double())
                    .col(ColumnDef::new(Admissions::EnrolledCourse).string())
                    .col(fk_id_col(manager, Admissions::ProcessedBy))
                    .col(timestamp_col(Admissions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admissions_record_id")
                            .from(Admissions::Table, Admissions::RecordId)
                            .to(Records::Table, Records::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(CertifiedAdmissions::Table)
                    .col(pk_id_col(manager, CertifiedAdmissions::Id))
                    .col(fk_id_col(manager, CertifiedAdmissions::RecordId))
                    .col(
                        ColumnDef::new(CertifiedAdmissions::PhoneNumber)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CertifiedAdmissions::Name).string().not_null())
                    .col(
                        ColumnDef::new(CertifiedAdmissions::CallerName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CertifiedAdmissions::Response).text())
                    .col(fk_id_col(manager, CertifiedAdmissions::ProcessedBy))
                    .col(timestamp_col(CertifiedAdmissions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certified_admissions_record_id")
                            .from(CertifiedAdmissions::Table, CertifiedAdmissions::RecordId)
                            .to(Records::Table, Records::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(OtherAdmissions::Table)
                    .col(pk_id_col(manager, OtherAdmissions::Id))
                    .col(fk_id_col(manager, OtherAdmissions::RecordId))
                    .col(
                        ColumnDef::new(OtherAdmissions::PhoneNumber)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OtherAdmissions::Name).string().not_null())
                    .col(
                        ColumnDef::new(OtherAdmissions::CallerName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OtherAdmissions::Response).text())
                    .col(ColumnDef::new(OtherAdmissions::DiscountRate).double())
                    .col(ColumnDef::new(OtherAdmissions::TotalFees).double())
                    .col(ColumnDef::new(OtherAdmissions::EnrolledCourse).string())
                    .col(ColumnDef::new(OtherAdmissions::FeesPaid).big_integer())
                    .col(ColumnDef::new(OtherAdmissions::CourseTotalFees).big_integer())
                    .col(ColumnDef::new(OtherAdmissions::CourseStartDate).timestamp())
                    .col(ColumnDef::new(OtherAdmissions::CourseEndDate).timestamp())
                    .col(ColumnDef::new(OtherAdmissions::PaymentMode).string())
                    .col(fk_id_col(manager, OtherAdmissions::ProcessedBy))
                    .col(timestamp_col(OtherAdmissions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_other_admissions_record_id")
                            .from(OtherAdmissions::Table, OtherAdmissions::RecordId)
                            .to(Records::Table, Records::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OtherAdmissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CertifiedAdmissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Admissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Records::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().to_owned()
}

fn fk_id_nullable_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    Username,
    PasswordHash,
    Role,
    CreatedAt,
}

#[derive(Iden)]
enum Records {
    Table,
    Id,
    CallerId,
    PhoneNumber,
    Name,
    Response,
    Notes,
    Visit,
    VisitBy,
    HiddenFromCaller,
    AssignedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Tasks {
    Table,
    Id,
    Title,
    Description,
    AssignedTo,
    AssignedBy,
    Deadline,
    Status,
    Progress,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Admissions {
    Table,
    Id,
    RecordId,
    AdmissionType,
    DiscountRate,
    TotalFees,
    EnrolledCourse,
    ProcessedBy,
    CreatedAt,
}

#[derive(Iden)]
enum CertifiedAdmissions {
    Table,
    Id,
    RecordId,
    PhoneNumber,
    Name,
    CallerName,
    Response,
    ProcessedBy,
    CreatedAt,
}

#[derive(Iden)]
enum OtherAdmissions {
    Table,
    Id,
    RecordId,
    PhoneNumber,
    Name,
    CallerName,
    Response,
    DiscountRate,
    TotalFees,
    EnrolledCourse,
    FeesPaid,
    CourseTotalFees,
    CourseStartDate,
    CourseEndDate,
    PaymentMode,
    ProcessedBy,
    CreatedAt,
}
