//! Initial database migration.
//!
//! Creates the enums, tables, triggers, and RLS policies for the fleet
//! fuel-request schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;

        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(VEHICLE_TYPES_SQL).await?;
        db.execute_unprepared(VEHICLES_SQL).await?;
        db.execute_unprepared(FUEL_REQUESTS_SQL).await?;
        db.execute_unprepared(VALIDATION_RECORDS_SQL).await?;
        db.execute_unprepared(ACTION_LOGS_SQL).await?;
        db.execute_unprepared(ATTACHMENTS_SQL).await?;

        db.execute_unprepared(TRIGGERS_SQL).await?;
        db.execute_unprepared(RLS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM (
    'driver',
    'supervisor',
    'fueler',
    'director',
    'admin'
);

CREATE TYPE request_status AS ENUM (
    'pending',
    'supervisor_approved',
    'fueler_approved',
    'director_approved',
    'rejected'
);

CREATE TYPE decision_outcome AS ENUM ('approved', 'rejected');
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL UNIQUE,
    display_name VARCHAR(255) NOT NULL,
    role user_role NOT NULL,
    password_hash TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_users_email ON users (email);
CREATE INDEX idx_users_role ON users (role);
";

const VEHICLE_TYPES_SQL: &str = r"
CREATE TABLE vehicle_types (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL UNIQUE,
    description TEXT,
    consumption_threshold NUMERIC(10, 2) CHECK (consumption_threshold > 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const VEHICLES_SQL: &str = r"
CREATE TABLE vehicles (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    plate_number VARCHAR(32) NOT NULL UNIQUE,
    vehicle_type_id UUID NOT NULL REFERENCES vehicle_types(id) ON DELETE RESTRICT,
    model VARCHAR(255),
    year INTEGER CHECK (year >= 1950),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_vehicles_type ON vehicles (vehicle_type_id);
CREATE INDEX idx_vehicles_active ON vehicles (is_active);
";

const FUEL_REQUESTS_SQL: &str = r"
CREATE TABLE fuel_requests (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    requester_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    vehicle_id UUID NOT NULL REFERENCES vehicles(id) ON DELETE RESTRICT,
    quantity_requested NUMERIC(10, 2) NOT NULL CHECK (quantity_requested > 0),
    quantity_served NUMERIC(10, 2) CHECK (quantity_served IS NULL OR quantity_served > 0),
    odometer_km BIGINT NOT NULL CHECK (odometer_km >= 0),
    site TEXT NOT NULL,
    mission TEXT NOT NULL,
    justification TEXT NOT NULL,
    status request_status NOT NULL DEFAULT 'pending',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_fuel_requests_requester ON fuel_requests (requester_id);
CREATE INDEX idx_fuel_requests_vehicle ON fuel_requests (vehicle_id);
CREATE INDEX idx_fuel_requests_status ON fuel_requests (status);
CREATE INDEX idx_fuel_requests_created ON fuel_requests (created_at DESC);
";

const VALIDATION_RECORDS_SQL: &str = r"
CREATE TABLE validation_records (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    request_id UUID NOT NULL REFERENCES fuel_requests(id) ON DELETE CASCADE,
    level SMALLINT NOT NULL CHECK (level BETWEEN 1 AND 3),
    validator_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    outcome decision_outcome NOT NULL,
    comment TEXT,
    decided_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    -- At most one decision per level per request
    UNIQUE (request_id, level)
);

CREATE INDEX idx_validation_records_request ON validation_records (request_id);
CREATE INDEX idx_validation_records_validator ON validation_records (validator_id);
";

const ACTION_LOGS_SQL: &str = r"
CREATE TABLE action_logs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    actor_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    action VARCHAR(64) NOT NULL,
    entity_type VARCHAR(64) NOT NULL,
    entity_id UUID NOT NULL,
    detail JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_action_logs_entity ON action_logs (entity_type, entity_id);
CREATE INDEX idx_action_logs_actor ON action_logs (actor_id);
CREATE INDEX idx_action_logs_created ON action_logs (created_at DESC);
";

const ATTACHMENTS_SQL: &str = r"
CREATE TABLE attachments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    request_id UUID NOT NULL REFERENCES fuel_requests(id) ON DELETE CASCADE,
    kind VARCHAR(32) NOT NULL,
    filename VARCHAR(512) NOT NULL,
    file_size BIGINT NOT NULL CHECK (file_size >= 0),
    mime_type VARCHAR(255) NOT NULL,
    storage_backend VARCHAR(32) NOT NULL,
    storage_key TEXT NOT NULL,
    uploaded_by UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    verified_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_attachments_request ON attachments (request_id);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER users_updated_at
    BEFORE UPDATE ON users
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER vehicle_types_updated_at
    BEFORE UPDATE ON vehicle_types
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER vehicles_updated_at
    BEFORE UPDATE ON vehicles
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER fuel_requests_updated_at
    BEFORE UPDATE ON fuel_requests
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const RLS_SQL: &str = r"
-- Drivers only see their own requests; validating roles see everything.
-- The application sets app.current_user_id and app.current_user_role with
-- SET LOCAL inside each transaction.
ALTER TABLE fuel_requests ENABLE ROW LEVEL SECURITY;

CREATE POLICY fuel_requests_visibility ON fuel_requests
    FOR SELECT
    USING (
        current_setting('app.current_user_role', TRUE) IS DISTINCT FROM 'driver'
        OR requester_id = current_setting('app.current_user_id', TRUE)::UUID
    );

CREATE POLICY fuel_requests_insert ON fuel_requests
    FOR INSERT
    WITH CHECK (
        requester_id = current_setting('app.current_user_id', TRUE)::UUID
    );

CREATE POLICY fuel_requests_update ON fuel_requests
    FOR UPDATE
    USING (
        current_setting('app.current_user_role', TRUE) IN
            ('supervisor', 'fueler', 'director', 'admin')
    );

ALTER TABLE attachments ENABLE ROW LEVEL SECURITY;

CREATE POLICY attachments_visibility ON attachments
    FOR SELECT
    USING (
        current_setting('app.current_user_role', TRUE) IS DISTINCT FROM 'driver'
        OR EXISTS (
            SELECT 1 FROM fuel_requests fr
            WHERE fr.id = attachments.request_id
              AND fr.requester_id = current_setting('app.current_user_id', TRUE)::UUID
        )
    );

CREATE POLICY attachments_write ON attachments
    FOR ALL
    USING (TRUE)
    WITH CHECK (
        uploaded_by = current_setting('app.current_user_id', TRUE)::UUID
    );
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS attachments CASCADE;
DROP TABLE IF EXISTS action_logs CASCADE;
DROP TABLE IF EXISTS validation_records CASCADE;
DROP TABLE IF EXISTS fuel_requests CASCADE;
DROP TABLE IF EXISTS vehicles CASCADE;
DROP TABLE IF EXISTS vehicle_types CASCADE;
DROP TABLE IF EXISTS users CASCADE;

DROP FUNCTION IF EXISTS set_updated_at() CASCADE;

DROP TYPE IF EXISTS decision_outcome;
DROP TYPE IF EXISTS request_status;
DROP TYPE IF EXISTS user_role;
";
