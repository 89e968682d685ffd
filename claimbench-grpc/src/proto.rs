//! Messages of `claims.ClaimsService`
//!
//! Only the fields the submitter sends are declared; prost skips unknown
//! fields when decoding, so the response body is accepted whatever claim
//! representation the service returns.

use claimbench_core::ClaimPayload;

#[derive(Clone, PartialEq, prost::Message)]
pub struct SubmitClaimRequest {
    #[prost(string, tag = "1")]
    pub policy_id: String,
    #[prost(string, tag = "2")]
    pub customer_id: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(double, tag = "4")]
    pub reported_amount: f64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SubmitClaimResponse {}

impl From<&ClaimPayload> for SubmitClaimRequest {
    fn from(payload: &ClaimPayload) -> Self {
        Self {
            policy_id: payload.policy_id.clone(),
            customer_id: payload.customer_id.clone(),
            description: payload.description.clone(),
            reported_amount: payload.reported_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_request_wire_format() {
        let request = SubmitClaimRequest {
            policy_id: "p".to_string(),
            customer_id: "c".to_string(),
            description: "d".to_string(),
            reported_amount: 1000.0,
        };
        let bytes = request.encode_to_vec();
        // field 1, wire type 2 (length-delimited), length 1, 'p'
        assert_eq!(&bytes[..3], &[0x0a, 0x01, b'p']);
        // field 4, wire type 1 (64-bit)
        assert_eq!(bytes[9], 0x21);
    }

    #[test]
    fn test_response_ignores_unknown_fields() {
        // field 1 holding an embedded message: {1: "claim-id"}
        let bytes = [0x0a, 0x0a, 0x0a, 0x08, b'c', b'l', b'a', b'i', b'm', b'-', b'i', b'd'];
        assert!(SubmitClaimResponse::decode(&bytes[..]).is_ok());
    }
}
