use std::convert::TryInto;
use std::io;

use byteorder::{BigEndian, ByteOrder};
use bytes::{Buf, BufMut, BytesMut};
use protobuf::{CodedOutputStream, Message};
use tokio_util::codec::{Decoder, Encoder};

use crate::proto;

/// Protobuf header is a big endian u32.
const CAST_MESSAGE_HEADER_LENGTH: usize = 4;
/// Max message size is [64KB](https://developers.google.com/cast/docs/reference/messages).
const CAST_MESSAGE_PROTOBUF_MAX_LENGTH: usize = 64 << 10;

/// `CastMessageCodec` decodes and encodes the length-prefixed protobuf that
/// makes up the Cast wire protocol. The decode phase is tracked explicitly so
/// the codec never drops bytes already read out of the `BytesMut` when a
/// `decode` call returns early for lack of data.
#[derive(Debug)]
enum DecodeState {
    Header,
    Payload(usize),
}

impl Default for DecodeState {
    fn default() -> Self {
        DecodeState::Header
    }
}

#[derive(Debug, Default)]
pub struct CastMessageCodec {
    state: DecodeState,
    decoded_frames: u64,
    encoded_frames: u64,
}

impl CastMessageCodec {
    fn decode_header(&mut self, src: &mut BytesMut) -> Result<Option<usize>, io::Error> {
        if src.len() < CAST_MESSAGE_HEADER_LENGTH {
            return Ok(None);
        }
        let header = src.split_to(CAST_MESSAGE_HEADER_LENGTH);
        let length = BigEndian::read_u32(&header) as usize;
        if length > CAST_MESSAGE_PROTOBUF_MAX_LENGTH {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "received frame of length {}, larger than max {}",
                    length, CAST_MESSAGE_PROTOBUF_MAX_LENGTH
                ),
            ));
        }
        src.reserve(length);
        Ok(Some(length))
    }
}

impl Decoder for CastMessageCodec {
    type Item = proto::CastMessage;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let n = match self.state {
            DecodeState::Header => match self.decode_header(src)? {
                Some(n) => n,
                None => return Ok(None),
            },
            DecodeState::Payload(n) => n,
        };
        self.state = DecodeState::Payload(n);
        if src.len() < n {
            return Ok(None);
        }
        let payload = src.split_to(n);
        self.state = DecodeState::Header;
        src.reserve(CAST_MESSAGE_HEADER_LENGTH);

        let message = protobuf::Message::parse_from_bytes(&payload)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        self.decoded_frames += 1;
        tracing::trace!(
            frame = self.decoded_frames,
            namespace = %message_namespace(&message),
            "decoded cast message"
        );
        Ok(Some(message))
    }
}

impl Encoder<proto::CastMessage> for CastMessageCodec {
    type Error = io::Error;

    fn encode(&mut self, item: proto::CastMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encoded_frames += 1;
        let mut buf = Vec::new();
        {
            let mut output = CodedOutputStream::new(&mut buf);
            item.write_to(&mut output)
                .and_then(|_| output.flush())
                .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        }
        if buf.len() > CAST_MESSAGE_PROTOBUF_MAX_LENGTH {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "encoded message of length {}, larger than max {}",
                    buf.len(),
                    CAST_MESSAGE_PROTOBUF_MAX_LENGTH
                ),
            ));
        }
        let msg_size: u32 = buf
            .len()
            .try_into()
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut header = [0u8; CAST_MESSAGE_HEADER_LENGTH];
        BigEndian::write_u32(&mut header, msg_size);

        dst.reserve(CAST_MESSAGE_HEADER_LENGTH + buf.len());
        dst.put_slice(&header);
        dst.put_slice(&buf);
        tracing::trace!(frame = self.encoded_frames, "encoded cast message");
        Ok(())
    }
}

fn message_namespace(message: &proto::CastMessage) -> &str {
    message.namespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> proto::CastMessage {
        let mut msg = proto::CastMessage::new();
        msg.set_protocol_version(proto::CastMessage_ProtocolVersion::CASTV2_1_0);
        msg.set_source_id("sender-0".to_owned());
        msg.set_destination_id("receiver-0".to_owned());
        msg.set_namespace("urn:x-cast:com.google.cast.tp.heartbeat".to_owned());
        msg.set_payload_type(proto::CastMessage_PayloadType::STRING);
        msg.set_payload_utf8("{\"type\":\"PING\"}".to_owned());
        msg
    }

    #[test]
    fn round_trips_a_single_frame() {
        let mut codec = CastMessageCodec::default();
        let mut buf = BytesMut::new();
        codec.encode(sample_message(), &mut buf).unwrap();

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.namespace(), sample_message().namespace());
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn decodes_across_partial_reads() {
        let mut codec = CastMessageCodec::default();
        let mut encoded = BytesMut::new();
        codec.encode(sample_message(), &mut encoded).unwrap();

        // Feed the header and nothing else: must not decode yet.
        let mut buf = BytesMut::from(&encoded[..2]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&encoded[2..6]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&encoded[6..]);
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.payload_utf8(), "{\"type\":\"PING\"}");
    }

    #[test]
    fn decodes_two_concatenated_frames() {
        let mut codec = CastMessageCodec::default();
        let mut buf = BytesMut::new();
        codec.encode(sample_message(), &mut buf).unwrap();
        codec.encode(sample_message(), &mut buf).unwrap();

        assert!(codec.decode(&mut buf).unwrap().is_some());
        assert!(codec.decode(&mut buf).unwrap().is_some());
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn rejects_oversized_frame_header_without_panicking() {
        let mut codec = CastMessageCodec::default();
        let mut buf = BytesMut::new();
        buf.put_u32(CAST_MESSAGE_PROTOBUF_MAX_LENGTH as u32 + 1);
        assert!(codec.decode(&mut buf).is_err());
    }
}
