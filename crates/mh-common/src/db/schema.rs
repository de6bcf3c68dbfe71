/// `recruit.candidates` schema definition.
pub const CANDIDATES_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS recruit.candidates (
    id BIGSERIAL PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    email TEXT,

    skills TEXT[] NOT NULL DEFAULT '{}',
    years_of_experience INTEGER,
    education JSONB,
    experience JSONB,
    languages TEXT[] NOT NULL DEFAULT '{}',

    professional_status TEXT,
    employment_status TEXT,
    city TEXT,
    country TEXT,
    availability_date DATE,

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

/// `recruit.jobs` schema definition.
pub const JOBS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS recruit.jobs (
    id BIGSERIAL PRIMARY KEY,
    company_id BIGINT,
    title TEXT,

    education_level TEXT,
    field_of_study TEXT,
    years_experience_required INTEGER,
    experience_domain TEXT,
    hard_skills TEXT,
    soft_skills TEXT,
    languages TEXT,

    application_ids BIGINT[] NOT NULL DEFAULT '{}',

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

/// `recruit.applications` schema definition. One row per (candidate, job)
/// pair; the analysis subdocument lands in `analysis` as JSONB.
pub const APPLICATIONS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS recruit.applications (
    id BIGSERIAL PRIMARY KEY,
    candidate_id BIGINT NOT NULL,
    job_id BIGINT NOT NULL,
    company_id BIGINT,

    submitted_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    analyzed_at TIMESTAMPTZ,

    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    status_note TEXT,
    rejected BOOLEAN NOT NULL DEFAULT false,

    analysis JSONB,

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_application_status CHECK (
        status IN ('pending', 'analyzing', 'analyzed', 'analysis_failed')
    ),
    CONSTRAINT uq_application_pair UNIQUE (candidate_id, job_id)
);
"#;

/// `recruit.analysis_queue` schema definition. Lease-based delivery:
/// `locked_by`/`lock_expires_at` hold the lease, `stalled_count` tracks how
/// often an expired lease sent the job back to waiting.
pub const ANALYSIS_QUEUE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS recruit.analysis_queue (
    id BIGSERIAL PRIMARY KEY,
    application_id BIGINT NOT NULL,

    state VARCHAR(20) NOT NULL DEFAULT 'waiting',
    attempts INTEGER NOT NULL DEFAULT 0,
    max_attempts INTEGER NOT NULL DEFAULT 3,
    next_attempt_at TIMESTAMPTZ,

    locked_by VARCHAR(100),
    lock_expires_at TIMESTAMPTZ,
    stalled_count INTEGER NOT NULL DEFAULT 0,

    last_error TEXT,

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    started_at TIMESTAMPTZ,
    completed_at TIMESTAMPTZ,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_queue_state CHECK (
        state IN ('waiting', 'delayed', 'active', 'completed', 'failed')
    ),
    CONSTRAINT chk_queue_attempts CHECK (attempts >= 0 AND attempts <= 100)
);
"#;

/// `recruit.queue_control` schema definition: a single row carrying the
/// paused flag consulted by workers before leasing.
pub const QUEUE_CONTROL_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS recruit.queue_control (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    paused BOOLEAN NOT NULL DEFAULT false,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

INSERT INTO recruit.queue_control (id, paused)
VALUES (1, false)
ON CONFLICT (id) DO NOTHING;
"#;

/// Supporting indexes for the hot queue paths.
pub const QUEUE_INDEXES_DDL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_analysis_queue_ready
    ON recruit.analysis_queue(created_at, id)
    WHERE state IN ('waiting', 'delayed');
CREATE INDEX IF NOT EXISTS idx_analysis_queue_state_created
    ON recruit.analysis_queue(state, created_at, id);
CREATE INDEX IF NOT EXISTS idx_applications_status_updated
    ON recruit.applications(status, updated_at);
"#;
