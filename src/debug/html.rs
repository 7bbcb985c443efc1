//! HTML page for the chat debugging console.
//!
//! A single-file page: session setup and chat on the left, the live debug
//! feed from `/ws` and the `/state` snapshot on the right.

/// The console page served at `/`.
pub const CONSOLE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>parley console</title>
    <style>
        * { box-sizing: border-box; margin: 0; padding: 0; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #1a1a2e;
            color: #eee;
            height: 100vh;
            display: flex;
            flex-direction: column;
        }

        .header {
            background: #16213e;
            padding: 12px 20px;
            display: flex;
            align-items: center;
            justify-content: space-between;
            border-bottom: 1px solid #0f3460;
        }

        .title { font-size: 18px; font-weight: 600; color: #e94560; }
        .status { font-size: 13px; color: #aaa; }
        .status.connected { color: #4ade80; }

        .main { flex: 1; display: grid; grid-template-columns: 1fr 1fr; min-height: 0; }
        .pane { display: flex; flex-direction: column; min-height: 0; border-right: 1px solid #0f3460; }
        .section { padding: 12px 16px; border-bottom: 1px solid #0f3460; }
        .section h2 { font-size: 12px; text-transform: uppercase; color: #888; margin-bottom: 8px; }

        input, textarea, select {
            background: #0f3460;
            color: #eee;
            border: 1px solid #1f4a80;
            border-radius: 4px;
            padding: 6px 8px;
            font-size: 13px;
        }
        textarea { width: 100%; font-family: monospace; resize: vertical; }
        button {
            background: #e94560;
            color: #fff;
            border: none;
            border-radius: 4px;
            padding: 6px 12px;
            cursor: pointer;
            font-size: 13px;
        }
        button.secondary { background: #0f3460; }
        .row { display: flex; gap: 8px; align-items: center; margin-bottom: 8px; flex-wrap: wrap; }

        .transcript { flex: 1; overflow-y: auto; padding: 12px 16px; }
        .msg { margin-bottom: 10px; padding: 8px 10px; border-radius: 6px; white-space: pre-wrap; }
        .msg.user { background: #0f3460; margin-left: 20%; }
        .msg.assistant { background: #22264a; margin-right: 20%; }
        .msg.streaming { border-left: 3px solid #facc15; }
        .msg .meta { font-size: 11px; color: #888; margin-bottom: 4px; }
        .msg .call { font-family: monospace; font-size: 12px; color: #93c5fd; }
        .options { display: flex; gap: 6px; margin-top: 6px; }

        .composer { display: flex; gap: 8px; padding: 12px 16px; border-top: 1px solid #0f3460; }
        .composer input[type=text] { flex: 1; }

        .events { flex: 1; overflow-y: auto; font-family: monospace; font-size: 12px; }
        .event { padding: 6px 16px; border-bottom: 1px solid #16213e; cursor: pointer; }
        .event .kind { color: #e94560; margin-right: 8px; }
        .event .time { color: #666; margin-right: 8px; }
        .event pre { display: none; margin-top: 6px; white-space: pre-wrap; color: #aaa; }
        .event.open pre { display: block; }
        .state { font-family: monospace; font-size: 12px; white-space: pre-wrap; max-height: 180px; overflow-y: auto; }
    </style>
</head>
<body>
    <div class="header">
        <span class="title">parley</span>
        <span id="status" class="status">disconnected</span>
    </div>
    <div class="main">
        <div class="pane">
            <div class="section">
                <h2>Session</h2>
                <div class="row">
                    <input id="userId" placeholder="userId">
                    <input id="sessionId" placeholder="sessionId" size="38">
                    <input id="appName" placeholder="appName">
                </div>
                <textarea id="state" rows="4" placeholder="initial state (JSON)"></textarea>
                <div class="row" style="margin-top: 8px">
                    <button onclick="createSession()">Create session</button>
                    <button class="secondary" onclick="saveConfig()">Save config</button>
                    <button class="secondary" onclick="clearTranscript()">Clear chat</button>
                    <button class="secondary" onclick="exportTranscript()">Export</button>
                </div>
            </div>
            <div id="transcript" class="transcript"></div>
            <div class="composer">
                <input id="message" type="text" placeholder="Message" onkeydown="if (event.key === 'Enter') send()">
                <label><input id="stream" type="checkbox" checked> stream</label>
                <button onclick="send()">Send</button>
            </div>
        </div>
        <div class="pane">
            <div class="section">
                <h2>State</h2>
                <div id="snapshot" class="state"></div>
            </div>
            <div class="section row">
                <h2 style="margin: 0">Events</h2>
                <button class="secondary" onclick="document.getElementById('events').innerHTML = ''">Clear</button>
            </div>
            <div id="events" class="events"></div>
        </div>
    </div>
    <script>
        const $ = (id) => document.getElementById(id);

        function key() {
            return encodeURIComponent($('userId').value) + '/' + encodeURIComponent($('sessionId').value);
        }

        async function loadConfig() {
            const res = await fetch('/api/config');
            const cfg = await res.json();
            $('userId').value = cfg.userId;
            $('sessionId').value = cfg.sessionId;
            $('appName').value = cfg.appName;
            $('state').value = JSON.stringify(cfg.state, null, 2);
            await loadTranscript();
        }

        function currentConfig() {
            let state = {};
            try { state = JSON.parse($('state').value || '{}'); } catch (e) { alert('Invalid JSON in initial state'); throw e; }
            return { userId: $('userId').value, sessionId: $('sessionId').value, appName: $('appName').value, state };
        }

        async function saveConfig() {
            await fetch('/api/config', {
                method: 'PUT',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(currentConfig()),
            });
        }

        async function createSession() {
            const res = await fetch('/api/session', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(currentConfig()),
            });
            const body = await res.json();
            if (!body.success) alert(body.error);
        }

        async function loadTranscript() {
            const res = await fetch('/api/transcript/' + key());
            if (res.ok) render((await res.json()).messages);
        }

        async function clearTranscript() {
            await fetch('/api/transcript/' + key(), { method: 'DELETE' });
            render([]);
        }

        function exportTranscript() {
            window.location = '/api/transcript/' + key() + '/export';
        }

        function render(messages) {
            const el = $('transcript');
            el.innerHTML = '';
            for (const m of messages) {
                const div = document.createElement('div');
                div.className = 'msg ' + m.role + (m.streaming ? ' streaming' : '');
                const meta = document.createElement('div');
                meta.className = 'meta';
                meta.textContent = [m.role, m.metadata && m.metadata.author, new Date(m.timestamp).toLocaleTimeString()]
                    .filter(Boolean).join(' · ');
                div.appendChild(meta);
                for (const p of (m.parts || [])) {
                    if (p.kind === 'functionCall' || p.kind === 'functionResponse') {
                        const call = document.createElement('div');
                        call.className = 'call';
                        call.textContent = p.kind + ' ' + p.name + ' ' + JSON.stringify(p.args || p.response);
                        div.appendChild(call);
                    }
                }
                div.appendChild(document.createTextNode(m.content));
                if (m.options) {
                    const opts = document.createElement('div');
                    opts.className = 'options';
                    for (const o of m.options) {
                        const b = document.createElement('button');
                        b.className = 'secondary';
                        b.textContent = o;
                        b.onclick = () => { $('message').value = o; send(); };
                        opts.appendChild(b);
                    }
                    div.appendChild(opts);
                }
                el.appendChild(div);
            }
            el.scrollTop = el.scrollHeight;
        }

        async function send() {
            const message = $('message').value;
            if (!message) return;
            $('message').value = '';
            const stream = $('stream').checked;
            const res = await fetch('/api/chat', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({
                    userId: $('userId').value,
                    sessionId: $('sessionId').value,
                    appName: $('appName').value,
                    message,
                    stream,
                }),
            });
            if (stream && res.ok && res.body) {
                const reader = res.body.getReader();
                while (true) {
                    const { done } = await reader.read();
                    await loadTranscript();
                    if (done) break;
                }
            } else {
                const body = await res.json();
                if (!body.success) alert(body.error);
                await loadTranscript();
            }
        }

        function addEvent(ev) {
            const div = document.createElement('div');
            div.className = 'event';
            const summary = ev.event.type === 'raw_frame' ? ev.event.line
                : ev.event.type === 'api_call' ? ev.event.request.method + ' ' + ev.event.request.url
                : ev.event.type === 'stream_lifecycle' ? ev.event.phase
                : ev.event.type === 'transcript_change' ? ev.event.message_id
                : ev.event.message;
            div.innerHTML = '<span class="time"></span><span class="kind"></span><span class="summary"></span><pre></pre>';
            div.querySelector('.time').textContent = new Date(ev.timestamp).toLocaleTimeString();
            div.querySelector('.kind').textContent = ev.event.type;
            div.querySelector('.summary').textContent = summary || '';
            div.querySelector('pre').textContent = JSON.stringify(ev, null, 2);
            div.onclick = () => div.classList.toggle('open');
            $('events').prepend(div);
        }

        async function refreshState() {
            const res = await fetch('/state');
            $('snapshot').textContent = JSON.stringify(await res.json(), null, 2);
        }

        function connect() {
            const protocol = window.location.protocol === 'https:' ? 'wss:' : 'ws:';
            const ws = new WebSocket(protocol + '//' + window.location.host + '/ws');
            ws.onopen = () => { $('status').textContent = 'connected'; $('status').className = 'status connected'; };
            ws.onclose = () => {
                $('status').textContent = 'disconnected';
                $('status').className = 'status';
                setTimeout(connect, 2000);
            };
            ws.onmessage = (msg) => {
                addEvent(JSON.parse(msg.data));
                refreshState();
            };
        }

        loadConfig();
        refreshState();
        connect();
    </script>
</body>
</html>
"#;
