// Static vocabularies for lexical keyword extraction.

pub const PROGRAMMING: &[&str] = &[
    "python",
    "java",
    "javascript",
    "c++",
    "ruby",
    "php",
    "scala",
    "swift",
    "kotlin",
    "golang",
    "rust",
    "typescript",
];

pub const FRAMEWORKS: &[&str] = &[
    "django", "flask", "fastapi", "spring", "react", "angular", "vue", "node.js", "express",
    "laravel", "rails",
];

pub const DATABASES: &[&str] = &[
    "sql",
    "mysql",
    "postgresql",
    "mongodb",
    "oracle",
    "redis",
    "elasticsearch",
    "cassandra",
    "dynamodb",
];

pub const CLOUD: &[&str] = &[
    "aws",
    "azure",
    "gcp",
    "docker",
    "kubernetes",
    "terraform",
    "jenkins",
    "circleci",
    "gitlab",
];

pub const MACHINE_LEARNING: &[&str] = &[
    "tensorflow",
    "pytorch",
    "scikit-learn",
    "keras",
    "opencv",
    "pandas",
    "numpy",
    "matplotlib",
    "seaborn",
];

pub const ACTION_VERBS: &[&str] = &[
    "develop",
    "implement",
    "design",
    "manage",
    "lead",
    "create",
    "improve",
    "increase",
    "reduce",
    "analyze",
    "coordinate",
    "achieve",
    "deliver",
    "launch",
    "build",
];

pub const TECHNICAL_VOCABULARIES: &[&[&str]] =
    &[PROGRAMMING, FRAMEWORKS, DATABASES, CLOUD, MACHINE_LEARNING];

pub fn is_technical_term(word: &str) -> bool {
    TECHNICAL_VOCABULARIES.iter().any(|v| v.contains(&word))
}

pub fn is_action_verb(word: &str) -> bool {
    ACTION_VERBS.contains(&word)
}
