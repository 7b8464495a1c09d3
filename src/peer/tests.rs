use super::*;
use crate::metainfo::InfoHash;
use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::net::TcpListener;

const WAIT: Duration = Duration::from_secs(2);
const SHORT: Duration = Duration::from_millis(20);

fn addr() -> SocketAddr {
    "127.0.0.1:6881".parse().unwrap()
}

fn info_hash() -> InfoHash {
    InfoHash::from([0xabu8; 20])
}

fn remote_handshake(info_hash: [u8; 20]) -> Bytes {
    Handshake::new(info_hash, *b"-XX0001-abcdefghijkl").encode()
}

async fn ready_session() -> (PeerSession<DuplexStream>, DuplexStream) {
    let (ours, mut theirs) = duplex(64 * 1024);
    let mut session = PeerSession::from_stream(addr(), ours, info_hash(), PeerId::generate());

    theirs
        .write_all(&remote_handshake(*info_hash().as_bytes()))
        .await
        .unwrap();
    session.handshake(WAIT).await.unwrap();

    let mut sent = [0u8; HANDSHAKE_LEN];
    theirs.read_exact(&mut sent).await.unwrap();
    assert_eq!(&sent[28..48], info_hash().as_bytes());

    (session, theirs)
}

#[test]
fn test_peer_id_generate() {
    let id1 = PeerId::generate();
    let id2 = PeerId::generate();
    assert_ne!(id1.0, id2.0);
    assert_eq!(&id1.0[..8], b"-LE0001-");
    assert_eq!(id1.client_id(), Some("LE0001"));
}

#[test]
fn test_peer_id_from_bytes() {
    assert!(PeerId::from_bytes(&[0u8; 19]).is_none());
    let id = PeerId::from_bytes(b"-XX0001-abcdefghijkl").unwrap();
    assert_eq!(id.client_id(), Some("XX0001"));
}

#[test]
fn test_bitfield_msb_first() {
    let bf = Bitfield::from_bytes(Bytes::from_static(&[0b1000_0001, 0b0100_0000]));

    assert!(bf.has_piece(0));
    assert!(!bf.has_piece(1));
    assert!(bf.has_piece(7));
    assert!(!bf.has_piece(8));
    assert!(bf.has_piece(9));
    assert_eq!(bf.count(), 3);
}

#[test]
fn test_bitfield_beyond_capacity_is_absent() {
    let bf = Bitfield::from_bytes(Bytes::from_static(&[0xff]));
    assert_eq!(bf.capacity(), 8);
    assert!(bf.has_piece(7));
    assert!(!bf.has_piece(8));
    assert!(!bf.has_piece(1000));
}

#[test]
fn test_bitfield_kept_verbatim() {
    let bf = Bitfield::from_bytes(Bytes::from_static(&[0b1110_0111]));
    assert_eq!(bf.as_bytes(), &[0b1110_0111]);
}

#[test]
fn test_bitfield_set_grows() {
    let mut bf = Bitfield::new(4);
    assert!(bf.is_empty());

    bf.set_piece(2);
    bf.set_piece(17);
    assert!(bf.has_piece(2));
    assert!(bf.has_piece(17));
    assert_eq!(bf.capacity(), 24);
}

#[test]
fn test_handshake_layout() {
    let encoded = Handshake::new([1u8; 20], [2u8; 20]).encode();

    assert_eq!(encoded.len(), HANDSHAKE_LEN);
    assert_eq!(encoded[0], 19);
    assert_eq!(&encoded[1..20], PROTOCOL);
    assert_eq!(&encoded[20..28], &[0u8; 8]);
    assert_eq!(&encoded[28..48], &[1u8; 20]);
    assert_eq!(&encoded[48..68], &[2u8; 20]);

    let decoded = Handshake::decode(&encoded).unwrap();
    assert_eq!(decoded.info_hash, [1u8; 20]);
    assert_eq!(decoded.peer_id, [2u8; 20]);
}

#[test]
fn test_handshake_rejects_bad_protocol() {
    let mut data = Handshake::new([1u8; 20], [2u8; 20]).encode().to_vec();

    data[0] = 18;
    assert!(matches!(
        Handshake::decode(&data),
        Err(PeerError::InvalidHandshake("protocol name length"))
    ));

    data[0] = 19;
    data[1] = b'b';
    assert!(matches!(
        Handshake::decode(&data),
        Err(PeerError::InvalidHandshake("protocol name"))
    ));

    assert!(matches!(
        Handshake::decode(&data[..40]),
        Err(PeerError::InvalidHandshake("truncated"))
    ));
}

#[test]
fn test_request_wire_format() {
    let encoded = Message::Request {
        index: 1,
        begin: 16384,
        length: 16384,
    }
    .encode();

    assert_eq!(
        &encoded[..],
        &[0, 0, 0, 13, 6, 0, 0, 0, 1, 0, 0, 0x40, 0, 0, 0, 0x40, 0]
    );
}

#[test]
fn test_message_encode_decode() {
    let messages = vec![
        Message::KeepAlive,
        Message::Choke,
        Message::Unchoke,
        Message::Interested,
        Message::NotInterested,
        Message::Have { piece: 42 },
        Message::Bitfield(Bytes::from_static(&[0xf0])),
        Message::Piece {
            index: 3,
            begin: 16384,
            data: Bytes::from_static(b"block"),
        },
        Message::Cancel {
            index: 1,
            begin: 0,
            length: 16384,
        },
    ];

    for message in messages {
        assert_eq!(Message::decode(message.encode()).unwrap(), message);
    }
}

#[test]
fn test_decode_unknown_message_id() {
    let frame = Bytes::from_static(&[0, 0, 0, 1, 20]);
    assert!(matches!(
        Message::decode(frame),
        Err(PeerError::InvalidMessageId(20))
    ));
}

#[test]
fn test_decode_wrong_payload_length() {
    let frame = Bytes::from_static(&[0, 0, 0, 3, 4, 0, 1]);
    assert!(matches!(
        Message::decode(frame),
        Err(PeerError::InvalidMessage(_))
    ));

    let short_piece = Bytes::from_static(&[0, 0, 0, 5, 7, 0, 0, 0, 1]);
    assert!(matches!(
        Message::decode(short_piece),
        Err(PeerError::InvalidMessage(_))
    ));
}

#[test]
fn test_plan_blocks() {
    let blocks = plan_blocks(0, 32768, 16384);
    assert_eq!(
        blocks,
        vec![
            BlockRequest::new(0, 0, 16384),
            BlockRequest::new(0, 16384, 16384),
        ]
    );

    let blocks = plan_blocks(2, 40000, 16384);
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[2], BlockRequest::new(2, 32768, 7232));
}

#[test]
fn test_choking_defaults() {
    let state = ChokingState::default();
    assert!(state.am_choking);
    assert!(!state.am_interested);
    assert!(state.peer_choking);
    assert!(!state.peer_interested);
    assert!(!state.can_request());
}

#[tokio::test]
async fn test_handshake_success() {
    let (session, _theirs) = ready_session().await;

    assert_eq!(session.state(), SessionState::Ready);
    assert!(session.is_ready());
    assert_eq!(
        session.remote_peer_id().and_then(|id| id.client_id()),
        Some("XX0001")
    );
    assert!(session.bitfield().is_none());
    assert!(!session.has_piece(0));
}

#[tokio::test]
async fn test_handshake_info_hash_mismatch() {
    let (ours, mut theirs) = duplex(4096);
    let mut session = PeerSession::from_stream(addr(), ours, info_hash(), PeerId::generate());

    theirs.write_all(&remote_handshake([0u8; 20])).await.unwrap();

    let result = session.handshake(WAIT).await;
    assert!(matches!(result, Err(PeerError::InfoHashMismatch)));
    assert_eq!(session.state(), SessionState::HandshakePending);

    session.close().await;
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_handshake_bad_pstrlen() {
    let (ours, mut theirs) = duplex(4096);
    let mut session = PeerSession::from_stream(addr(), ours, info_hash(), PeerId::generate());

    let mut data = remote_handshake(*info_hash().as_bytes()).to_vec();
    data[0] = 20;
    theirs.write_all(&data).await.unwrap();

    assert!(matches!(
        session.handshake(WAIT).await,
        Err(PeerError::InvalidHandshake(_))
    ));
    assert!(!session.is_ready());
}

#[tokio::test]
async fn test_handshake_times_out() {
    let (ours, _theirs) = duplex(4096);
    let mut session = PeerSession::from_stream(addr(), ours, info_hash(), PeerId::generate());

    assert!(matches!(
        session.handshake(SHORT).await,
        Err(PeerError::Timeout)
    ));
}

#[tokio::test]
async fn test_receive_requires_ready() {
    let (ours, _theirs) = duplex(4096);
    let mut session = PeerSession::from_stream(addr(), ours, info_hash(), PeerId::generate());

    assert!(matches!(
        session.receive(SHORT).await,
        Err(PeerError::NotReady)
    ));
    assert!(matches!(
        session.send_interested().await,
        Err(PeerError::NotReady)
    ));
}

#[tokio::test]
async fn test_receive_timeout_is_no_message() {
    let (mut session, _theirs) = ready_session().await;
    assert!(session.receive(SHORT).await.unwrap().is_none());
    assert!(session.receive(SHORT).await.unwrap().is_none());
}

#[tokio::test]
async fn test_keep_alive_is_no_event() {
    let (mut session, mut theirs) = ready_session().await;
    theirs.write_all(&[0, 0, 0, 0]).await.unwrap();
    assert!(session.receive(WAIT).await.unwrap().is_none());
}

#[tokio::test]
async fn test_partial_frame_survives_timeout() {
    let (mut session, mut theirs) = ready_session().await;

    theirs.write_all(&[0, 0, 0]).await.unwrap();
    assert!(session.receive(SHORT).await.unwrap().is_none());

    theirs.write_all(&[1, 1]).await.unwrap();
    assert_eq!(session.receive(WAIT).await.unwrap(), Some(Message::Unchoke));
    assert!(!session.choking.peer_choking);
}

#[tokio::test]
async fn test_receive_applies_state() {
    let (mut session, mut theirs) = ready_session().await;

    theirs.write_all(&Message::Unchoke.encode()).await.unwrap();
    theirs.write_all(&Message::Interested.encode()).await.unwrap();
    theirs
        .write_all(&Message::Have { piece: 3 }.encode())
        .await
        .unwrap();
    theirs
        .write_all(&Message::Bitfield(Bytes::from_static(&[0b0100_0000])).encode())
        .await
        .unwrap();
    theirs.write_all(&Message::Choke.encode()).await.unwrap();

    assert_eq!(session.receive(WAIT).await.unwrap(), Some(Message::Unchoke));
    assert!(!session.choking.peer_choking);

    session.receive(WAIT).await.unwrap();
    assert!(session.choking.peer_interested);

    session.receive(WAIT).await.unwrap();
    assert!(!session.has_piece(3));
    assert!(session.bitfield().is_none());

    session.receive(WAIT).await.unwrap();
    assert!(session.has_piece(1));
    assert!(!session.has_piece(0));

    assert_eq!(session.receive(WAIT).await.unwrap(), Some(Message::Choke));
    assert!(session.choking.peer_choking);
}

#[tokio::test]
async fn test_piece_counts_downloaded_bytes() {
    let (mut session, mut theirs) = ready_session().await;

    let piece = Message::Piece {
        index: 0,
        begin: 0,
        data: Bytes::from(vec![9u8; 1000]),
    };
    theirs.write_all(&piece.encode()).await.unwrap();

    assert_eq!(session.receive(WAIT).await.unwrap(), Some(piece));
    assert_eq!(session.bytes_downloaded(), 1000);
}

#[tokio::test]
async fn test_unknown_id_is_error() {
    let (mut session, mut theirs) = ready_session().await;
    theirs.write_all(&[0, 0, 0, 1, 9]).await.unwrap();
    assert!(matches!(
        session.receive(WAIT).await,
        Err(PeerError::InvalidMessageId(9))
    ));
}

#[tokio::test]
async fn test_oversized_frame_is_error() {
    let (mut session, mut theirs) = ready_session().await;
    theirs.write_all(&[0x7f, 0xff, 0xff, 0xff]).await.unwrap();
    assert!(matches!(
        session.receive(WAIT).await,
        Err(PeerError::InvalidMessage(_))
    ));
}

#[tokio::test]
async fn test_remote_close_is_error() {
    let (mut session, theirs) = ready_session().await;
    drop(theirs);
    assert!(matches!(
        session.receive(WAIT).await,
        Err(PeerError::ConnectionClosed)
    ));
}

#[tokio::test]
async fn test_outbound_messages() {
    let (mut session, mut theirs) = ready_session().await;

    session.send_interested().await.unwrap();
    assert!(session.choking.am_interested);
    session.send_request(2, 16384, 100).await.unwrap();
    session.send_cancel(2, 16384, 100).await.unwrap();
    session.send_not_interested().await.unwrap();
    assert!(!session.choking.am_interested);

    let mut buf = vec![0u8; 5 + 17 + 17 + 5];
    theirs.read_exact(&mut buf).await.unwrap();

    assert_eq!(&buf[..5], &[0, 0, 0, 1, 2]);
    assert_eq!(
        Message::decode(Bytes::copy_from_slice(&buf[5..22])).unwrap(),
        Message::Request {
            index: 2,
            begin: 16384,
            length: 100
        }
    );
    assert_eq!(buf[26], 8);
    assert_eq!(&buf[39..], &[0, 0, 0, 1, 3]);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let (mut session, _theirs) = ready_session().await;

    session.close().await;
    session.close().await;

    assert_eq!(session.state(), SessionState::Closed);
    assert!(!session.is_ready());
    assert!(matches!(
        session.receive(SHORT).await,
        Err(PeerError::NotReady)
    ));
}

#[tokio::test]
async fn test_connect_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let peer_addr = listener.local_addr().unwrap();
    let hash = info_hash();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; HANDSHAKE_LEN];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf[48..56], b"-LE0001-");

        stream
            .write_all(&remote_handshake(*hash.as_bytes()))
            .await
            .unwrap();
        stream
            .write_all(&Message::Bitfield(Bytes::from_static(&[0b1010_0000])).encode())
            .await
            .unwrap();
    });

    let mut session = PeerSession::connect(peer_addr, hash, PeerId::generate(), WAIT)
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::HandshakePending);
    assert_eq!(session.addr(), peer_addr);

    session.handshake(WAIT).await.unwrap();
    assert!(matches!(
        session.receive(WAIT).await.unwrap(),
        Some(Message::Bitfield(_))
    ));
    assert!(session.has_piece(0));
    assert!(!session.has_piece(1));
    assert!(session.has_piece(2));
    assert!(!session.has_piece(100));

    session.close().await;
    server.await.unwrap();
}
