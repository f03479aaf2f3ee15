//! Per-tenant CREATE TABLE statements.
//!
//! Every statement is `CREATE TABLE IF NOT EXISTS`, so re-running the whole
//! catalog against an existing tenant is a no-op.

use crate::database::tenant::{EntityTable, TableNameError, TenantId};

/// Generate the DDL that creates `entity`'s table for `tenant`
pub fn create_table_ddl(entity: EntityTable, tenant: TenantId) -> Result<String, TableNameError> {
    let table = entity.table_for(tenant)?.quoted();
    let t = |other: EntityTable| other.table_for(tenant).map(|n| n.quoted());

    let ddl = match entity {
        EntityTable::Category => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "category_name" VARCHAR(100) NOT NULL,
    "category_description" TEXT,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#
        ),
        EntityTable::Course => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "course_name" VARCHAR(255) NOT NULL UNIQUE,
    "course_price" VARCHAR(255) NOT NULL,
    "course_duration" VARCHAR(100) NOT NULL,
    "course_level" TEXT NOT NULL CHECK ("course_level" IN ('beginner', 'intermediate', 'advance')),
    "course_thumbnail" VARCHAR(500),
    "course_description" TEXT,
    "teacher_id" UUID,
    "category_id" UUID NOT NULL REFERENCES {category} ("id"),
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#,
            category = t(EntityTable::Category)?
        ),
        EntityTable::Teacher => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "first_name" VARCHAR(255) NOT NULL,
    "last_name" VARCHAR(255) NOT NULL,
    "teacher_email" VARCHAR(255) NOT NULL UNIQUE,
    "teacher_phone_number" VARCHAR(255) NOT NULL UNIQUE,
    "teacher_experience" VARCHAR(255),
    "joined_date" DATE,
    "salary" VARCHAR(100),
    "teacher_photo" VARCHAR(500),
    "teacher_password" VARCHAR(255),
    "course_id" UUID REFERENCES {course} ("id") ON DELETE SET NULL,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#,
            course = t(EntityTable::Course)?
        ),
        EntityTable::Student => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "first_name" VARCHAR(255) NOT NULL,
    "last_name" VARCHAR(255) NOT NULL,
    "student_phone_no" VARCHAR(255) NOT NULL UNIQUE,
    "student_address" TEXT,
    "enrolled_date" DATE,
    "student_image" VARCHAR(500),
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#
        ),
        EntityTable::CourseChapter => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "chapter_name" VARCHAR(255) NOT NULL,
    "chapter_duration" VARCHAR(100) NOT NULL,
    "chapter_level" TEXT NOT NULL CHECK ("chapter_level" IN ('beginner', 'intermediate', 'advance')),
    "course_id" UUID REFERENCES {course} ("id") ON DELETE CASCADE ON UPDATE CASCADE,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#,
            course = t(EntityTable::Course)?
        ),
        EntityTable::ChapterLesson => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "lesson_name" VARCHAR(255) NOT NULL,
    "lesson_description" TEXT,
    "lesson_duration" VARCHAR(100),
    "lesson_video" VARCHAR(500),
    "lesson_order" INTEGER NOT NULL DEFAULT 0,
    "chapter_id" UUID REFERENCES {chapter} ("id") ON DELETE CASCADE ON UPDATE CASCADE,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#,
            chapter = t(EntityTable::CourseChapter)?
        ),
        EntityTable::Attendance => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "student_id" UUID NOT NULL REFERENCES {student} ("id") ON DELETE CASCADE,
    "course_id" UUID NOT NULL REFERENCES {course} ("id") ON DELETE CASCADE,
    "attendance_date" DATE NOT NULL,
    "status" TEXT NOT NULL DEFAULT 'present' CHECK ("status" IN ('present', 'absent', 'late', 'excused')),
    "remarks" TEXT,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#,
            student = t(EntityTable::Student)?,
            course = t(EntityTable::Course)?
        ),
        EntityTable::Assessment => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "course_id" UUID REFERENCES {course} ("id") ON DELETE CASCADE,
    "title" VARCHAR(255) NOT NULL,
    "assessment_type" TEXT NOT NULL DEFAULT 'exam' CHECK ("assessment_type" IN ('quiz', 'exam', 'assignment', 'project')),
    "max_marks" INTEGER NOT NULL,
    "assessment_date" DATE,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#,
            course = t(EntityTable::Course)?
        ),
        EntityTable::Result => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "student_id" UUID REFERENCES {student} ("id") ON DELETE CASCADE,
    "assessment_id" UUID REFERENCES {assessment} ("id") ON DELETE CASCADE,
    "marks_obtained" NUMERIC(5, 2) NOT NULL,
    "status" TEXT NOT NULL DEFAULT 'graded' CHECK ("status" IN ('passed', 'failed', 'graded')),
    "remarks" TEXT,
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#,
            student = t(EntityTable::Student)?,
            assessment = t(EntityTable::Assessment)?
        ),
        EntityTable::FeeStructure => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "name" VARCHAR(255) NOT NULL,
    "amount" NUMERIC(10, 2) NOT NULL,
    "frequency" TEXT NOT NULL DEFAULT 'monthly' CHECK ("frequency" IN ('monthly', 'quarterly', 'yearly', 'once')),
    "description" TEXT,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#
        ),
        EntityTable::FeePayment => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "student_id" UUID REFERENCES {student} ("id") ON DELETE CASCADE,
    "fee_structure_id" UUID REFERENCES {fee_structure} ("id"),
    "amount_paid" NUMERIC(10, 2) NOT NULL,
    "balance" NUMERIC(10, 2) NOT NULL,
    "payment_date" DATE NOT NULL,
    "payment_method" TEXT NOT NULL DEFAULT 'cash' CHECK ("payment_method" IN ('cash', 'bank_transfer', 'online', 'cheque')),
    "status" TEXT NOT NULL DEFAULT 'paid' CHECK ("status" IN ('paid', 'partial', 'pending')),
    "receipt_number" VARCHAR(50),
    "remarks" TEXT,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#,
            student = t(EntityTable::Student)?,
            fee_structure = t(EntityTable::FeeStructure)?
        ),
        EntityTable::ExamSchedule => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "assessment_id" UUID REFERENCES {assessment} ("id") ON DELETE CASCADE,
    "exam_date" DATE NOT NULL,
    "start_time" TIME NOT NULL,
    "end_time" TIME NOT NULL,
    "room_id" VARCHAR(50),
    "invigilator_id" UUID REFERENCES {teacher} ("id"),
    "instructions" TEXT,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#,
            assessment = t(EntityTable::Assessment)?,
            teacher = t(EntityTable::Teacher)?
        ),
        EntityTable::SecurityLog => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "user_id" UUID,
    "action" VARCHAR(255) NOT NULL,
    "details" TEXT,
    "timestamp" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#
        ),
        EntityTable::Library => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "title" VARCHAR(255) NOT NULL,
    "author" VARCHAR(255) NOT NULL,
    "isbn" VARCHAR(50) NOT NULL,
    "category" VARCHAR(100) NOT NULL DEFAULT 'General',
    "description" TEXT,
    "cover_image" VARCHAR(500),
    "total_copies" INTEGER NOT NULL DEFAULT 1 CHECK ("total_copies" >= 1),
    "available_copies" INTEGER NOT NULL DEFAULT 1 CHECK ("available_copies" >= 0 AND "available_copies" <= "total_copies"),
    "published_year" INTEGER,
    "status" TEXT NOT NULL DEFAULT 'available' CHECK ("status" IN ('available', 'low-stock', 'out-of-stock')),
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#
        ),
        EntityTable::LibraryBorrow => format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
    "id" UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    "book_id" UUID NOT NULL REFERENCES {library} ("id") ON DELETE CASCADE,
    "student_id" UUID NOT NULL REFERENCES {student} ("id") ON DELETE CASCADE,
    "borrow_date" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "due_date" DATE,
    "return_date" TIMESTAMPTZ,
    "status" TEXT NOT NULL DEFAULT 'borrowed' CHECK ("status" IN ('borrowed', 'returned')),
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#,
            library = t(EntityTable::Library)?,
            student = t(EntityTable::Student)?
        ),
    };

    Ok(ddl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> TenantId {
        TenantId::new(2024).unwrap()
    }

    #[test]
    fn every_statement_is_idempotent() {
        for entity in EntityTable::ALL {
            let ddl = create_table_ddl(entity, tenant()).unwrap();
            assert!(
                ddl.starts_with("CREATE TABLE IF NOT EXISTS "),
                "{entity:?} is not guarded: {ddl}"
            );
        }
    }

    #[test]
    fn statements_target_the_tenant_table() {
        let ddl = create_table_ddl(EntityTable::LibraryBorrow, tenant()).unwrap();
        assert!(ddl.contains("\"library_borrow_2024\""));
        assert!(ddl.contains("REFERENCES \"library_2024\""));
        assert!(ddl.contains("REFERENCES \"student_2024\""));
    }

    #[test]
    fn references_point_backwards_in_catalog_order() {
        // A table may only reference tables created before it
        for (idx, entity) in EntityTable::ALL.iter().enumerate() {
            let ddl = create_table_ddl(*entity, tenant()).unwrap();
            for later in &EntityTable::ALL[idx + 1..] {
                let later_name = later.table_for(tenant()).unwrap().quoted();
                assert!(
                    !ddl.contains(&format!("REFERENCES {later_name}")),
                    "{entity:?} references {later:?} which is created later"
                );
            }
        }
    }

    #[test]
    fn library_enforces_copy_bounds() {
        let ddl = create_table_ddl(EntityTable::Library, tenant()).unwrap();
        assert!(ddl.contains("\"available_copies\" <= \"total_copies\""));
        assert!(ddl.contains("'out-of-stock'"));
    }
}
