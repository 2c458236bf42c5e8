use bytes::{Buf, BufMut, BytesMut};

use super::ActivityError;

pub const SERVERDATA_AUTH: i32 = 3;
pub const SERVERDATA_AUTH_RESPONSE: i32 = 2;
pub const SERVERDATA_EXECCOMMAND: i32 = 2;
pub const SERVERDATA_RESPONSE_VALUE: i32 = 0;

/// id + type + two terminating nulls
const HEADER_LEN: usize = 10;
const MAX_BODY_LEN: usize = 4096;

/// One RCON frame: `len: i32le, id: i32le, type: i32le, body, 0x00, 0x00`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub kind: i32,
    pub body: String,
}

impl Packet {
    pub fn new(id: i32, kind: i32, body: &str) -> Self {
        Self { id, kind, body: body.to_owned() }
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        let body = self.body.as_bytes();
        dst.reserve(4 + HEADER_LEN + body.len());
        dst.put_i32_le((HEADER_LEN + body.len()) as i32);
        dst.put_i32_le(self.id);
        dst.put_i32_le(self.kind);
        dst.put_slice(body);
        dst.put_u8(0);
        dst.put_u8(0);
    }

    /// Takes one complete frame off the front of `src`.
    ///
    /// `Ok(None)` means more bytes are needed; nothing is consumed then.
    pub fn decode(src: &mut BytesMut) -> Result<Option<Packet>, ActivityError> {
        if src.len() < 4 {
            return Ok(None);
        }

        let len = i32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        if len < HEADER_LEN as i32 || len as usize > HEADER_LEN + MAX_BODY_LEN {
            return Err(ActivityError::Malformed(format!("frame length {}", len)));
        }
        let len = len as usize;
        if src.len() < 4 + len {
            return Ok(None);
        }

        src.advance(4);
        let mut frame = src.split_to(len);
        let id = frame.get_i32_le();
        let kind = frame.get_i32_le();
        let body = frame.split_to(len - HEADER_LEN);
        if frame[..] != [0, 0] {
            return Err(ActivityError::Malformed(String::from("missing frame terminator")));
        }

        Ok(Some(Packet {
            id,
            kind,
            body: String::from_utf8_lossy(&body).into_owned(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_encodes_a_command() {
        let mut buf = BytesMut::new();
        Packet::new(7, SERVERDATA_EXECCOMMAND, "list").encode(&mut buf);
        assert_eq!(
            &buf[..],
            &[14, 0, 0, 0, 7, 0, 0, 0, 2, 0, 0, 0, b'l', b'i', b's', b't', 0, 0]
        );
    }

    #[test]
    fn it_decodes_an_auth_failure() {
        let mut buf = BytesMut::from(&[10u8, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 2, 0, 0, 0, 0, 0][..]);
        let packet = Packet::decode(&mut buf).unwrap().unwrap();
        assert_eq!(packet.id, -1);
        assert_eq!(packet.kind, SERVERDATA_AUTH_RESPONSE);
        assert_eq!(packet.body, "");
        assert!(buf.is_empty());
    }

    #[test]
    fn it_waits_for_a_complete_frame() {
        let mut full = BytesMut::new();
        Packet::new(1, SERVERDATA_RESPONSE_VALUE, "There are 0 of a max of 20 players online:").encode(&mut full);

        let mut partial = BytesMut::from(&full[..9]);
        assert_eq!(Packet::decode(&mut partial).unwrap(), None);
        assert_eq!(partial.len(), 9);

        partial.extend_from_slice(&full[9..]);
        let packet = Packet::decode(&mut partial).unwrap().unwrap();
        assert_eq!(packet.body, "There are 0 of a max of 20 players online:");
    }

    #[test]
    fn it_leaves_the_next_frame_in_the_buffer() {
        let mut buf = BytesMut::new();
        Packet::new(1, SERVERDATA_RESPONSE_VALUE, "").encode(&mut buf);
        Packet::new(2, SERVERDATA_AUTH_RESPONSE, "").encode(&mut buf);

        assert_eq!(Packet::decode(&mut buf).unwrap().unwrap().id, 1);
        assert_eq!(Packet::decode(&mut buf).unwrap().unwrap().id, 2);
        assert_eq!(Packet::decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn it_rejects_a_bogus_length() {
        let mut buf = BytesMut::from(&[3u8, 0, 0, 0, 0, 0, 0, 0][..]);
        assert!(Packet::decode(&mut buf).is_err());
    }
}
