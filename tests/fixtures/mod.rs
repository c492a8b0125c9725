//! Canned documents and analysis results for the stub service.

use serde_json::{json, Value};

use audit_client::models::document::{DocumentFile, PDF_CONTENT_TYPE};

/// Smallest byte sequence the client accepts as a PDF.
pub fn sample_pdf() -> DocumentFile {
    DocumentFile::new(
        "network-policy.pdf",
        PDF_CONTENT_TYPE,
        b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n%%EOF".to_vec(),
    )
}

/// A complete analysis result as the service returns it.
pub fn full_report() -> Value {
    json!({
        "Conclusion": "The document describes a reasonable baseline.",
        "ExecutiveSummary": "Two high severity issues need attention.",
        "Findings": [
            {
                "issue": "Weak password policy",
                "details": "Passwords of 6 characters are accepted",
                "impact": "Brute force attacks become feasible"
            },
            {
                "issue": "No MFA on VPN",
                "details": "Remote access relies on a single factor",
                "impact": "Stolen credentials grant network access"
            }
        ],
        "Introduction": "",
        "Metadata": {
            "creation_date": "2024-03-01T09:30:00Z",
            "author": "IT Security",
            "page_count": 12
        },
        "Recommendations": [
            {
                "action": "Require 14 character passwords",
                "rationale": "Aligns with current guidance",
                "impact": "Raises brute force cost"
            }
        ],
        "Results": {
            "overall_result": [
                {
                    "grade": "C",
                    "security_level": "Moderate",
                    "scope": "Corporate network"
                }
            ],
            "issues": [
                {"Severity": "High", "issues": 2},
                {"Severity": "Low", "issues": 2}
            ],
            "Vulnerabilities": []
        }
    })
}
